//! Backup commands

mod export_backup;
mod restore_backup;

pub use export_backup::ExportBackupCommand;
pub use restore_backup::RestoreBackupCommand;

use serde_json::{json, Value};

fn kind_schema() -> Value {
    json!({ "type": "string", "enum": ["configuration", "subtitles"] })
}
