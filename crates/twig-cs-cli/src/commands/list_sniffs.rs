//! List sniffs command implementation.

use twig_cs_sniffs::{all_sniffs, Preset};

/// Runs the list-sniffs command.
pub fn run() {
    println!("Available sniffs:\n");
    println!(
        "{:<8} {:<24} {:<12} {:<8} Description",
        "Code", "Name", "Phase", "Level"
    );
    println!("{}", "-".repeat(96));

    for sniff in all_sniffs() {
        println!(
            "{:<8} {:<24} {:<12} {:<8} {}",
            sniff.code(),
            sniff.name(),
            sniff.phase().to_string(),
            sniff.default_severity().to_string(),
            sniff.description()
        );
    }

    println!("\nPresets:");
    for preset in [Preset::Recommended, Preset::Strict, Preset::Minimal] {
        let codes: Vec<String> = preset
            .sniffs()
            .iter()
            .map(|s| s.code().to_string())
            .collect();
        println!("  {:<12} - {}", preset.as_str(), codes.join(", "));
    }

    println!("\nUse --sniffs to run specific sniffs, e.g.:");
    println!("  twig-cs check --sniffs line-length,no-dump");
    println!("  twig-cs check --sniffs TCS001,TCS101");
}
