fn main() {
    let exit_code = match walk::run::run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("walk: error: {:#}", err);
            1
        }
    };
    std::process::exit(exit_code);
}
