use std::fs;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Write the OpenAPI document to a file")]
struct Args {
    /// Destination path
    #[arg(short, long, default_value = "openapi.json")]
    output: String,
    /// Port used in the `servers` entry
    #[arg(short, long, default_value_t = 8000)]
    port: u16,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let doc = taskdesk::docs::build_openapi(args.port)?;
    fs::write(&args.output, serde_json::to_string_pretty(&doc)?)?;
    println!("wrote {}", args.output);
    Ok(())
}
