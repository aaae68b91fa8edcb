/// Splits a comma separated form value into trimmed, non-empty entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trims `value` and returns it unless nothing is left.
pub fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Human readable byte size with one decimal for KB and MB.
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_trims_and_drops_empty_entries() {
        assert_eq!(split_list("HR, 원격 ,,"), vec!["HR", "원격"]);
        assert!(split_list(" , ").is_empty());
    }

    #[test]
    fn email_check_requires_both_parts() {
        assert!(looks_like_email("user@company.com"));
        assert!(!looks_like_email("user@"));
        assert!(!looks_like_email("@company.com"));
        assert!(!looks_like_email("user company.com"));
        assert!(!looks_like_email("us er@company.com"));
    }

    #[test]
    fn file_sizes_use_binary_units() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1024000), "1000.0 KB");
        assert_eq!(format_file_size(2048576), "2.0 MB");
        assert_eq!(format_file_size(4194304), "4.0 MB");
    }
}
