use clap::Args;
use eyre::Result;
use metagen_schema::{MemberDefFlags, Schema};

#[derive(Args)]
pub struct ListCommand {
    /// Dump the full schema as JSON
    #[arg(long)]
    pub json: bool,
}

impl ListCommand {
    pub fn run(&self) -> Result<()> {
        let schema = Schema::native_format();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&schema)?);
            return Ok(());
        }

        println!("Enums:");
        for name in schema.enum_types.keys() {
            println!("  {name} (framework)");
        }
        for def in &schema.enums {
            println!("  {} ({} values)", def.name, def.members.len());
        }

        println!("\nRecords:");
        for record in &schema.records {
            let persisted = record
                .members
                .iter()
                .filter(|m| !m.flags.intersects(MemberDefFlags::NOT_PERSISTED))
                .count();
            let mut notes = Vec::new();
            if schema.is_string_record(&record.name) {
                notes.push("string");
            }
            if persisted != record.members.len() {
                notes.push("partial");
            }
            let suffix = if notes.is_empty() {
                String::new()
            } else {
                format!(" [{}]", notes.join(", "))
            };
            println!(
                "  {} ({} members, {} persisted){}",
                record.name,
                record.members.len(),
                persisted,
                suffix
            );
        }

        Ok(())
    }
}
