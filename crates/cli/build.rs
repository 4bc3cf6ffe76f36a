use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("gleaner")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Gleaner Contributors")
        .about("Fetch a web page and extract its structured content")
        .arg(clap::arg!(<INPUT> "URL to fetch, local HTML file, or '-' for stdin"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (json, text, flat, csv, digest)")
                .value_name("FORMAT")
                .default_value("json")
                .value_parser(["json", "text", "flat", "csv", "digest"]),
        )
        .arg(clap::arg!(--compact "Single-line JSON"))
        .arg(clap::arg!(--timeout <SECS> "Total HTTP timeout in seconds").default_value("30"))
        .arg(clap::arg!(--"connect-timeout" <SECS> "Connect timeout in seconds").default_value("10"))
        .arg(clap::arg!(--retries <NUM> "Total attempts per fetch, the first included").default_value("3"))
        .arg(clap::arg!(--"max-connections" <NUM> "Maximum concurrent connections").default_value("10"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests").value_name("UA"))
        .arg(clap::arg!(--insecure "Skip TLS certificate validation (debugging only)"))
        .arg(clap::arg!(--"digest-budget" <CHARS> "Character budget of the digest format").default_value("15000"))
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "gleaner", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "gleaner", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "gleaner", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "gleaner", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
