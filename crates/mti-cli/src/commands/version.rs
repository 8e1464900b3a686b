//! Version command implementation.

use crate::style::colors::SemanticStyle;

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn run() {
    println!("{} {}", "mti".header(), format!("v{VERSION}").muted());
    println!();
    println!("Missing-tag identification simulator for passive RFID.");
    println!();
    println!("Build info:");
    println!("  Protocols: {}", "lods".code());
    println!("  Target:    {}", std::env::consts::ARCH);
    println!("  OS:        {}", std::env::consts::OS);
}
