use std::io::BufRead;

use mero_gamala_api::services::admin_service::hash_password;

/// Prints an argon2 PHC string for `ADMIN_PASSWORD_HASH`. The password is
/// read from the first argument, or from stdin when no argument is given.
fn main() -> anyhow::Result<()> {
    let password = match std::env::args().nth(1) {
        Some(password) => password,
        None => {
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    anyhow::ensure!(!password.is_empty(), "password must not be empty");

    let hash = hash_password(&password)?;
    println!("ADMIN_PASSWORD_HASH={hash}");
    Ok(())
}
