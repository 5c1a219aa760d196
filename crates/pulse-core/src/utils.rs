//! Common utility functions

/// Mask sensitive data for logging
pub fn mask_sensitive(data: &str) -> String {
    if data.chars().count() <= 8 {
        "***".to_string()
    } else {
        let chars: Vec<char> = data.chars().collect();
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}***{}", head, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_sensitive() {
        assert_eq!(mask_sensitive("short"), "***");
        assert_eq!(mask_sensitive("pk_live_1234567890"), "pk_l***7890");
    }
}
