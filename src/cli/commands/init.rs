//! Write the default configuration file.

use crate::models::config;
use crate::Result;
use colored::Colorize;

pub fn init() -> Result<()> {
    let defaults = config::SafetyConfig::default();
    config::save_config(&defaults)?;
    println!("{}", "[OK] Default configuration written".green());
    Ok(())
}
