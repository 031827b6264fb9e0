//! Progress bar utilities for long pipeline stages

use indicatif::{ProgressBar, ProgressStyle};

/// Create a progress bar for a counted batch of files or records
pub fn create_progress_bar(total: u64, message: impl Into<String>) -> ProgressBar {
    let bar = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")
    {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar.set_message(message.into());
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_progress_bar() {
        let bar = create_progress_bar(42, "Parsing structures files");
        assert_eq!(bar.length(), Some(42));
        bar.finish();
    }
}
