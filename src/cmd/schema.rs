//! Schema command - JSON Schema of the result structure

use clap::Args;
use schemars::schema_for;

use crate::tax::TaxReport;

#[derive(Args, Debug)]
pub struct SchemaCommand {}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let schema = schema_for!(TaxReport);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }
}
