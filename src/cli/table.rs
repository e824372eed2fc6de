//! Table output for reviews and personas using comfy-table.

use comfy_table::{presets, Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use std::env;

use crate::domain::models::{GameReview, MoveLabel, Persona, PlayerSide};

use super::output::{signed, truncate};

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    pub const fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// One row per reviewed move.
    pub fn format_moves(&self, review: &GameReview) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["#", "Move", "Label", "Delta", "Eval", "Why"]));

        for mr in &review.message_reviews {
            let text = review.message(&mr.message_id).map_or("", |m| m.text.as_str());
            table.add_row(vec![
                Cell::new(mr.move_number).set_alignment(CellAlignment::Right),
                Cell::new(truncate(text, 40)),
                self.label_cell(mr.label),
                Cell::new(signed(mr.eval_delta)).set_alignment(CellAlignment::Right),
                Cell::new(signed(mr.eval_after)).set_alignment(CellAlignment::Right),
                Cell::new(truncate(&mr.explanation, 60)),
            ]);
        }

        table.to_string()
    }

    /// Label tallies for both players, skipping labels nobody earned.
    pub fn format_label_counts(&self, review: &GameReview) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Label", "You", "Them"]));

        let you = review.label_counts.for_side(PlayerSide::You);
        let them = review.label_counts.for_side(PlayerSide::Them);
        for label in MoveLabel::ALL {
            let (mine, theirs) = (you.get(label), them.get(label));
            if mine == 0 && theirs == 0 {
                continue;
            }
            table.add_row(vec![
                self.label_cell(label),
                Cell::new(mine).set_alignment(CellAlignment::Right),
                Cell::new(theirs).set_alignment(CellAlignment::Right),
            ]);
        }

        table.to_string()
    }

    pub fn format_personas(&self, personas: &[Persona]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["ID", "", "Name", "Vibe"]));

        for persona in personas {
            table.add_row(vec![
                Cell::new(persona.id),
                Cell::new(persona.avatar),
                Cell::new(persona.name),
                Cell::new(persona.vibe),
            ]);
        }

        table.to_string()
    }

    fn label_cell(&self, label: MoveLabel) -> Cell {
        if self.use_colors {
            Cell::new(label.as_str()).fg(label_color(label))
        } else {
            Cell::new(format!("{} {}", label_icon(label), label))
        }
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|title| Cell::new(title).add_attribute(Attribute::Bold))
        .collect()
}

fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}

const fn label_color(label: MoveLabel) -> Color {
    match label {
        MoveLabel::BrilliantMove => Color::Cyan,
        MoveLabel::BestMove | MoveLabel::ExcellentMove => Color::Green,
        MoveLabel::GreatMove => Color::Blue,
        MoveLabel::GoodMove | MoveLabel::BookMove => Color::White,
        MoveLabel::Inaccuracy => Color::Yellow,
        MoveLabel::Mistake => Color::DarkYellow,
        MoveLabel::Blunder => Color::Red,
    }
}

/// Chess annotation glyphs, for terminals without color.
const fn label_icon(label: MoveLabel) -> &'static str {
    match label {
        MoveLabel::BrilliantMove => "!!",
        MoveLabel::GreatMove => "!",
        MoveLabel::BestMove | MoveLabel::ExcellentMove => "★",
        MoveLabel::GoodMove => "✓",
        MoveLabel::BookMove => "📖",
        MoveLabel::Inaccuracy => "?!",
        MoveLabel::Mistake => "?",
        MoveLabel::Blunder => "??",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::PersonaTable;
    use crate::services::demo_review;

    #[test]
    fn test_moves_table_lists_every_move() {
        let review = demo_review().unwrap();
        let rendered = TableFormatter::with_config(false, Some(160)).format_moves(&review);
        assert!(rendered.contains("?? blunder"));
        assert!(rendered.contains("!! brilliant move"));
        assert!(rendered.contains("-1.25"));
    }

    #[test]
    fn test_label_counts_skip_empty_rows() {
        let review = demo_review().unwrap();
        let rendered = TableFormatter::with_config(false, Some(120)).format_label_counts(&review);
        assert!(rendered.contains("blunder"));
        assert!(!rendered.contains("inaccuracy"));
    }

    #[test]
    fn test_persona_table() {
        let rendered =
            TableFormatter::with_config(false, Some(120)).format_personas(PersonaTable.all());
        assert!(rendered.contains("golden-retriever"));
        assert!(rendered.contains("Quinn"));
    }
}
