use crate::error::RecognitionError;

/// Largest SR value a capture can legitimately show
pub const MAX_SR: u32 = 99_999;

/// Keep only ASCII digits, in order ("2,450\n" -> "2450")
pub fn clean_digits(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Parse SR from recognized text.
/// Separators and whitespace are dropped; the result must lie in 0-99999.
pub fn parse_sr(text: &str) -> Result<u32, RecognitionError> {
    let digits = clean_digits(text);

    if digits.is_empty() {
        return Err(RecognitionError::NoDigits {
            raw_text: text.to_string(),
        });
    }

    let value = digits
        .parse::<u64>()
        .map_err(|e| RecognitionError::ParseError {
            digits: digits.clone(),
            reason: e.to_string(),
        })?;

    if !validate_sr(value) {
        return Err(RecognitionError::OutOfRange { value });
    }

    Ok(value as u32)
}

/// Validate SR is within acceptable range (0-99999)
pub fn validate_sr(value: u64) -> bool {
    value <= MAX_SR as u64
}
