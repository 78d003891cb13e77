use super::Parser;

#[derive(Parser, Debug)]
#[command(about = "Token-pair auth demo server")]
pub struct Cli {
    /// Path to a TOML settings file.
    #[arg(long)]
    pub settings: Option<String>,
}
