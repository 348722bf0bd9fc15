use crate::domain::models::JsonOut;
use serde::Serialize;

pub fn print_one<T: Serialize>(json: bool, data: T, row: impl Fn(&T) -> String) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data })?
        );
    } else {
        println!("{}", row(&data));
    }
    Ok(())
}

/// Failure-path twin of `print_one`: the JSON envelope carries `ok: false`.
pub fn print_err<T: Serialize>(json: bool, data: T, row: impl Fn(&T) -> String) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: false, data })?
        );
    } else {
        println!("{}", row(&data));
    }
    Ok(())
}
