//! `personas`: list practice personas.

use anyhow::Result;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::cli::table::TableFormatter;
use crate::domain::models::{Persona, PersonaTable};

#[derive(Debug, Serialize)]
pub struct PersonaListOutput {
    pub personas: Vec<Persona>,
    pub total: usize,
}

impl CommandOutput for PersonaListOutput {
    fn to_human(&self) -> String {
        format!(
            "{} personas:\n{}",
            self.total,
            TableFormatter::new().format_personas(&self.personas)
        )
    }
}

pub fn execute(json_mode: bool) -> Result<()> {
    let personas = PersonaTable.all().to_vec();
    output(
        &PersonaListOutput {
            total: personas.len(),
            personas,
        },
        json_mode,
    );
    Ok(())
}
