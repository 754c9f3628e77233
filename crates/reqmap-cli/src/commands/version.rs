use miette::Result;
use reqmap_core::version::{version_string, VERSION};

pub fn run(json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::json!({ "name": "reqmap", "version": VERSION }));
    } else {
        println!("{}", version_string());
    }
    Ok(())
}
