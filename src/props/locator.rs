use super::types::Section;

/// Find the section opened by `header`.
///
/// The first line whose trimmed text equals `header` starts the section; it
/// runs until the first later line whose trimmed text is one of
/// `terminators` (`""` matches a blank line, `"#"` a bare comment), or to the
/// end of the file. `None` means the category is absent, which is not an
/// error for callers.
pub fn locate<S: AsRef<str>>(lines: &[S], header: &str, terminators: &[&str]) -> Option<Section> {
    let start = lines.iter().position(|l| l.as_ref().trim() == header)?;
    let end = lines[start + 1..]
        .iter()
        .position(|l| terminators.contains(&l.as_ref().trim()))
        .map(|offset| start + 1 + offset)
        .unwrap_or(lines.len());
    Some(Section { start, end })
}

/// Copy of the section's lines, header included. Empty when absent.
pub fn extract_block<S: AsRef<str>>(lines: &[S], header: &str, terminators: &[&str]) -> Vec<String> {
    match locate(lines, header, terminators) {
        Some(section) => lines[section.start..section.end]
            .iter()
            .map(|l| l.as_ref().to_string())
            .collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LMKD_END: &[&str] = &["# Chimera property", "# DHA property"];
    const CHIMERA_END: &[&str] = &["# Nandswap", "#", ""];

    #[test]
    fn test_locate_until_next_header() {
        let lines = [
            "# LMKD property\n",
            "ro.lmk.low=1001\n",
            "\n",
            "# Chimera property\n",
            "ro.chimera.enable=true\n",
        ];
        let section = locate(&lines, "# LMKD property", LMKD_END).unwrap();
        assert_eq!(section, Section { start: 0, end: 3 });
    }

    #[test]
    fn test_locate_runs_to_eof() {
        let lines = ["x=1\n", "# Chimera property\n", "a=1\n", "b=2"];
        let section = locate(&lines, "# Chimera property", CHIMERA_END).unwrap();
        assert_eq!(section, Section { start: 1, end: 4 });
    }

    #[test]
    fn test_blank_and_bare_hash_terminate() {
        let lines = ["# Chimera property\n", "a=1\n", "   \n", "b=2\n"];
        assert_eq!(
            locate(&lines, "# Chimera property", CHIMERA_END),
            Some(Section { start: 0, end: 2 })
        );

        let lines = ["# Chimera property\n", "a=1\n", " #\n", "b=2\n"];
        assert_eq!(
            locate(&lines, "# Chimera property", CHIMERA_END),
            Some(Section { start: 0, end: 2 })
        );
    }

    #[test]
    fn test_header_is_not_its_own_terminator() {
        // "#"-style terminators must not match the header line itself
        let lines = ["#\n", "# Chimera property\n", "a=1\n"];
        let section = locate(&lines, "# Chimera property", &["# Chimera property", "#"]).unwrap();
        assert_eq!(section, Section { start: 1, end: 3 });
    }

    #[test]
    fn test_missing_header_and_case_sensitivity() {
        let lines = ["# lmkd property\n", "a=1\n"];
        assert_eq!(locate(&lines, "# LMKD property", LMKD_END), None);
        assert!(extract_block(&lines, "# LMKD property", LMKD_END).is_empty());
    }
}
