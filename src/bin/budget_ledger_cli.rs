use budget_ledger::{
    cli::{core::CliError, run_cli},
    utils::build_info,
};

fn main() {
    if let Some(arg) = std::env::args().nth(1) {
        let err = match arg.as_str() {
            "--version" | "-V" => {
                println!("{}", build_info::summary());
                return;
            }
            other => CliError::Input(format!("unexpected argument `{other}`")),
        };
        eprintln!("{err}");
        std::process::exit(2);
    }

    if let Err(err) = run_cli() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
