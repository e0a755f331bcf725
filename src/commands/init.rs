use std::io::{self, Write};

use crate::config::{Config, DEFAULT_API_BASE};
use crate::error::{Result, UsersError};

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Render the config file body, leaving out values that match the defaults.
pub fn config_contents(api_base: &str, debounce_ms: Option<u64>) -> String {
    let mut contents = String::new();
    if !api_base.is_empty() && api_base != DEFAULT_API_BASE {
        contents.push_str(&format!("api_base = \"{api_base}\"\n"));
    }
    if let Some(ms) = debounce_ms {
        contents.push_str(&format!("debounce_ms = {ms}\n"));
    }
    contents
}

pub async fn run() -> Result<()> {
    let config_path = Config::config_path()?;

    if config_path.exists() {
        let answer = prompt(&format!(
            "Config file already exists at {}. Overwrite? [y/N] ",
            config_path.display()
        ))?;

        if !answer.eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    println!("Users CLI Configuration");
    println!("=======================\n");

    let api_base = prompt(&format!("API base URL [{DEFAULT_API_BASE}]: "))?;
    let debounce = prompt("Search debounce in milliseconds [600]: ")?;
    let debounce_ms = if debounce.is_empty() {
        None
    } else {
        match debounce.parse::<u64>() {
            Ok(ms) => Some(ms),
            Err(_) => {
                println!("Ignoring '{debounce}', keeping the default.");
                None
            }
        }
    };

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| UsersError::ConfigWrite {
            path: config_path.clone(),
            source: e,
        })?;
    }

    std::fs::write(&config_path, config_contents(&api_base, debounce_ms)).map_err(|e| {
        UsersError::ConfigWrite {
            path: config_path.clone(),
            source: e,
        }
    })?;

    println!("\nConfig saved to {}", config_path.display());
    println!("You can now use 'users list' and 'users browse'!");

    Ok(())
}
