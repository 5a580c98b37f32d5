use pataba_core::error::PatabaError;
use serde::Serialize;

pub fn print<T: Serialize>(value: &T) -> Result<(), PatabaError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
