/// Extensions accepted for uploaded documents
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "png", "jpg", "jpeg"];

const MAX_HASH_LENGTH: usize = 128;
const MAX_TITLE_LENGTH: usize = 255;

/// Validates an email address shape: one `@`, a non-empty local part and a dotted domain
pub fn validate_email(value: &str) -> Result<(), String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("Email cannot be empty".to_string());
    }
    if value.chars().any(char::is_whitespace) {
        return Err("Invalid email format".to_string());
    }

    let (local, domain) = value
        .split_once('@')
        .ok_or_else(|| "Invalid email format".to_string())?;
    if local.is_empty() || domain.contains('@') {
        return Err("Invalid email format".to_string());
    }

    let labels: Vec<&str> = domain.split('.').collect();
    let tld_ok = labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()));
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) || !tld_ok {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}

/// Validates a hex encoded content hash
pub fn validate_hash(value: &str) -> Result<(), String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("Hash cannot be empty".to_string());
    }
    if value.len() > MAX_HASH_LENGTH {
        return Err("Hash is too long".to_string());
    }
    if !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err("Hash must be hex encoded".to_string());
    }
    Ok(())
}

pub fn validate_title(value: &str) -> Result<(), String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("Title is required".to_string());
    }
    if value.chars().count() > MAX_TITLE_LENGTH {
        return Err("Title must be at most 255 characters".to_string());
    }
    Ok(())
}

/// Lowercased extension of `file_name` if it is on the upload allowlist
pub fn allowed_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// MIME type implied by an allowed extension
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}

/// Reduces a client supplied file name to `[A-Za-z0-9._-]`
pub fn sanitize_filename(file_name: &str) -> String {
    // Browsers on Windows may send the full client path
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}
