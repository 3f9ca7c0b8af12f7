//! Interactive mode for the server.
//!
//! Prompts for the listen address and input files before starting.

use std::path::PathBuf;

use dialoguer::{Confirm, Input};

use crate::ServerConfig;

/// Asks for each setting, offering the current value as the default.
///
/// Returns `None` if the user declines to start the server. A prompt that
/// can't be read keeps the value it was offered.
#[must_use]
pub fn prompt(current: ServerConfig) -> Option<ServerConfig> {
    println!("Montreal Crime Dashboard Server");
    println!();

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default(current.bind_addr.clone())
        .interact_text()
        .unwrap_or_else(|_| current.bind_addr.clone());

    let port: u16 = Input::new()
        .with_prompt("Port")
        .default(current.port)
        .interact_text()
        .unwrap_or(current.port);

    let data_path = prompt_path("Incident CSV (blank to search)", current.data_path.clone());
    let districts_path = prompt_path(
        "District GeoJSON (blank to search)",
        current.districts_path.clone(),
    );

    let start = Confirm::new()
        .with_prompt(format!("Start server on {bind_addr}:{port}?"))
        .default(true)
        .interact()
        .unwrap_or(true);

    start.then_some(ServerConfig {
        bind_addr,
        port,
        data_path,
        districts_path,
    })
}

fn prompt_path(prompt: &str, current: Option<PathBuf>) -> Option<PathBuf> {
    let offered = current
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let answer: String = Input::new()
        .with_prompt(prompt)
        .default(offered.clone())
        .allow_empty(true)
        .interact_text()
        .unwrap_or(offered);

    let answer = answer.trim();
    (!answer.is_empty()).then(|| PathBuf::from(answer))
}
