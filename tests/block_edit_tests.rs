use std::fs;
use std::path::{Path, PathBuf};

use prop_tuner::props::PropertyMap;
use tempfile::TempDir;

// Helper to create a .mk file inside a scratch directory
fn create_mk_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write test file");
    path
}

fn backups_of(path: &Path) -> Vec<PathBuf> {
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    let mut found: Vec<PathBuf> = fs::read_dir(path.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().starts_with(&format!("{}.bak_", name)))
                .unwrap_or(false)
        })
        .collect();
    found.sort();
    found
}

fn map(pairs: &[(&str, &str)]) -> PropertyMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

const DEVICE_MK: &str = "\
LOCAL_PATH := $(call my-dir)

# LMKD property
PRODUCT_PROPERTY_OVERRIDES += \\
    ro.lmk.low=1001 \\
    ro.lmk.medium=800
    ro.lmk.use_psi=true  # psi monitors

# Chimera property
PRODUCT_PROPERTY_OVERRIDES += \\
    ro.slmk.enable=true \\
    ro.slmk.chimera_quota=2000

# Nandswap
ro.nandswap.size=4096
";

#[cfg(test)]
mod locator_tests {
    use super::*;
    use prop_tuner::editor::split_lines;
    use prop_tuner::props::{locate, Category};

    #[test]
    fn test_sections_of_device_file() {
        let lines = split_lines(DEVICE_MK);
        let (spec, lmkd) = Category::Lmkd.locate(&lines).unwrap();
        assert_eq!(spec.header, "# LMKD property");
        assert_eq!((lmkd.start, lmkd.end), (2, 8));

        // the blank line after the Chimera group closes it
        let (_, chimera) = Category::Chimera.locate(&lines).unwrap();
        assert_eq!((chimera.start, chimera.end), (8, 12));
    }

    #[test]
    fn test_missing_header_is_not_found() {
        let lines = split_lines("# DHA property\nx=9\n# Chimera property\n");
        assert!(locate(&lines, "# LMKD property", &["# Chimera property"]).is_none());
        assert_eq!(Category::Lmkd.extract(&lines), Some(map(&[("x", "9")])));
    }

    #[test]
    fn test_header_match_is_exact_and_case_sensitive() {
        let lines = split_lines("# lmkd property\n# LMKD properties\na=1\n");
        assert!(locate(&lines, "# LMKD property", &[]).is_none());
        let lines = split_lines("   # LMKD property   \na=1\n");
        assert!(locate(&lines, "# LMKD property", &[]).is_some());
    }
}

#[cfg(test)]
mod parser_tests {
    use super::*;
    use prop_tuner::editor::split_lines;
    use prop_tuner::props::{parse_section, Category};

    #[test]
    fn test_group_and_plain_lines() {
        let lines = split_lines(DEVICE_MK);
        let lmkd = Category::Lmkd.extract(&lines).unwrap();
        assert_eq!(
            lmkd,
            map(&[
                ("ro.lmk.low", "1001"),
                ("ro.lmk.medium", "800"),
                ("ro.lmk.use_psi", "true"),
            ])
        );
        let keys: Vec<&str> = lmkd.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["ro.lmk.low", "ro.lmk.medium", "ro.lmk.use_psi"]);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let lines = [
            "# LMKD property\n",
            "this line has no assignment\n",
            "=orphan\n",
            "ok=1\n",
        ];
        assert_eq!(parse_section(&lines), map(&[("ok", "1")]));
    }

    #[test]
    fn test_last_duplicate_wins() {
        let lines = ["# LMKD property\n", "a=1\n", "b=2\n", "a=3\n"];
        let parsed = parse_section(&lines);
        assert_eq!(parsed, map(&[("a", "3"), ("b", "2")]));
    }

    #[test]
    fn test_value_keeps_text_after_first_equals() {
        let lines = ["# Chimera property\n", "ro.args=a=b  # note\n"];
        assert_eq!(parse_section(&lines), map(&[("ro.args", "a=b")]));
    }
}

#[cfg(test)]
mod synthesizer_tests {
    use super::*;
    use prop_tuner::editor::split_lines;
    use prop_tuner::props::{parse_section, synthesize, Category};

    fn lmkd_section() -> Vec<String> {
        let lines = split_lines(DEVICE_MK);
        let (_, s) = Category::Lmkd.locate(&lines).unwrap();
        lines[s.start..s.end].to_vec()
    }

    #[test]
    fn test_scenario_a_update_and_delete() {
        let lines = [
            "# LMKD property\n",
            "    a=1  # tuned on bench\n",
            "    b=2\n",
        ];
        let out = synthesize(&lines, &map(&[("a", "5")]));
        assert_eq!(out, vec!["# LMKD property\n", "    a=5  # tuned on bench\n"]);
    }

    #[test]
    fn test_scenario_c_backslash_moves() {
        let lines = [
            "# Chimera property\n",
            "PRODUCT_PROPERTY_OVERRIDES += \\\n",
            "    p=1 \\\n",
            "    q=2\n",
        ];
        let out = synthesize(&lines, &map(&[("p", "1"), ("q", "2"), ("r", "3")]));
        assert_eq!(out[2], "    p=1 \\\n");
        assert_eq!(out[3], "    q=2 \\\n");
        assert_eq!(out[4], "    r=3\n");
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn test_idempotence() {
        let section = lmkd_section();
        let wanted = map(&[
            ("ro.lmk.medium", "700"),
            ("ro.lmk.use_psi", "false"),
            ("ro.lmk.critical", "0"),
        ]);
        let once = synthesize(&section, &wanted);
        let twice = synthesize(&once, &wanted);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_table_values_rewrite_stably() {
        use prop_tuner::props::PropertyTable;

        let mut table = PropertyTable::default();
        table.set(Category::Lmkd, "ro.lmk.use_psi", "false").unwrap();
        table.set(Category::Lmkd, "ro.lmk.psi_path", "/proc/pressure/memory").unwrap();
        table.set(Category::Lmkd, "ro.lmk.empty", "").unwrap();
        assert!(table.set(Category::Lmkd, "ro.lmk.low", "a#b").is_err());

        let wanted = table.category(Category::Lmkd);
        let once = synthesize(&lmkd_section(), wanted);
        let twice = synthesize(&once, wanted);
        assert_eq!(once, twice);
        assert_eq!(&parse_section(&once), wanted);
    }

    #[test]
    fn test_round_trip() {
        let section = lmkd_section();
        let wanted = map(&[
            ("ro.lmk.use_psi", "false"),
            ("ro.lmk.low", "900"),
            ("ro.lmk.kill_heaviest_task", "true"),
        ]);
        let out = synthesize(&section, &wanted);
        let parsed = parse_section(&out);
        assert_eq!(parsed, wanted);
        assert!(!parsed.contains_key("ro.lmk.medium"));
    }

    #[test]
    fn test_order_preserved_and_new_keys_last_in_group() {
        let section = lmkd_section();
        let wanted = map(&[
            ("ro.lmk.new_one", "1"),
            ("ro.lmk.use_psi", "true"),
            ("ro.lmk.medium", "800"),
            ("ro.lmk.low", "1001"),
        ]);
        let out = synthesize(&section, &wanted);
        assert_eq!(
            out,
            vec![
                "# LMKD property\n",
                "PRODUCT_PROPERTY_OVERRIDES += \\\n",
                "    ro.lmk.low=1001 \\\n",
                "    ro.lmk.medium=800 \\\n",
                "    ro.lmk.new_one=1\n",
                "    ro.lmk.use_psi=true  # psi monitors\n",
                "\n",
            ]
        );
    }

    #[test]
    fn test_continuation_correctness() {
        let section = lmkd_section();
        let wanted = map(&[
            ("ro.lmk.low", "1"),
            ("ro.lmk.medium", "2"),
            ("ro.lmk.a", "3"),
            ("ro.lmk.b", "4"),
        ]);
        let out = synthesize(&section, &wanted);
        // intro + 4 members follow the header
        let group = &out[2..6];
        let continued = group.iter().filter(|l| l.ends_with(" \\\n")).count();
        assert_eq!(continued, 3);
        assert!(group[3].ends_with("=4\n"));
        assert!(!group[3].contains('\\'));
    }

    #[test]
    fn test_emptied_group_drops_intro_backslash() {
        let lines = [
            "# Chimera property\n",
            "PRODUCT_PROPERTY_OVERRIDES += \\\n",
            "    p=1 \\\n",
            "    q=2\n",
        ];
        let out = synthesize(&lines, &PropertyMap::new());
        assert_eq!(out, vec!["# Chimera property\n", "PRODUCT_PROPERTY_OVERRIDES +=\n"]);
    }

    #[test]
    fn test_no_special_treatment_for_any_key_name() {
        let lines = [
            "# Chimera property\n",
            "PRODUCT_PROPERTY_OVERRIDES += \\\n",
            "    test=1 \\\n",
            "    p=2\n",
        ];
        let out = synthesize(&lines, &map(&[("test", "1"), ("p", "2"), ("z", "3")]));
        assert_eq!(out[2], "    test=1 \\\n");
        assert_eq!(out[4], "    z=3\n");
    }

    #[test]
    fn test_crlf_lines_stay_crlf() {
        let lines = ["# LMKD property\r\n", "a=1\r\n"];
        let out = synthesize(&lines, &map(&[("a", "2"), ("b", "3")]));
        assert_eq!(out, vec!["# LMKD property\r\n", "a=2\r\n", "b=3\r\n"]);
    }
}

#[cfg(test)]
mod driver_tests {
    use super::*;
    use prop_tuner::editor::{apply_section_updates, EditError, SectionChange, SectionUpdate};
    use prop_tuner::props::Category;

    #[test]
    fn test_non_interference_and_backup() {
        let dir = TempDir::new().unwrap();
        let path = create_mk_file(&dir, "device.mk", DEVICE_MK);

        let update = SectionUpdate::for_category(
            Category::Chimera,
            SectionChange::Merge(map(&[("ro.slmk.enable", "false")])),
        );
        let report = apply_section_updates(&path, &[update]).unwrap();
        assert_eq!(report.applied, vec!["# Chimera property".to_string()]);

        let after = fs::read_to_string(&path).unwrap();
        let (before_head, _) = DEVICE_MK.split_once("# Chimera property").unwrap();
        let (after_head, _) = after.split_once("# Chimera property").unwrap();
        assert_eq!(before_head, after_head);
        assert!(after.ends_with("\n# Nandswap\nro.nandswap.size=4096\n"));
        assert!(after.contains("PRODUCT_PROPERTY_OVERRIDES += \\\n    ro.slmk.enable=false\n\n"));

        assert_eq!(backups_of(&path), vec![report.backup.clone()]);
        assert_eq!(fs::read_to_string(&report.backup).unwrap(), DEVICE_MK);
    }

    #[test]
    fn test_scenario_b_dha_fallback() {
        let dir = TempDir::new().unwrap();
        let path = create_mk_file(&dir, "dha.mk", "# DHA property\nx=9\n# Chimera property\nc=1\n");

        let update = SectionUpdate::for_category(
            Category::Lmkd,
            SectionChange::Merge(map(&[("x", "10")])),
        );
        let report = apply_section_updates(&path, &[update]).unwrap();
        assert_eq!(report.applied, vec!["# DHA property".to_string()]);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "# DHA property\nx=10\n# Chimera property\nc=1\n"
        );
    }

    #[test]
    fn test_scenario_e_updates_see_previous_rewrite() {
        let dir = TempDir::new().unwrap();
        let path = create_mk_file(
            &dir,
            "seq.mk",
            "# LMKD property\na=1\n# Chimera property\nc=1\n\n# tail\n",
        );

        let updates = [
            SectionUpdate::for_category(
                Category::Lmkd,
                SectionChange::Merge(map(&[("a", "1"), ("b", "2"), ("d", "4")])),
            ),
            SectionUpdate::for_category(
                Category::Chimera,
                SectionChange::Merge(map(&[("c", "7")])),
            ),
        ];
        let report = apply_section_updates(&path, &updates).unwrap();
        assert_eq!(report.applied.len(), 2);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "# LMKD property\na=1\nb=2\nd=4\n# Chimera property\nc=7\n\n# tail\n"
        );
    }

    #[test]
    fn test_absent_section_is_skipped() {
        let dir = TempDir::new().unwrap();
        let content = "# LMKD property\na=1\n";
        let path = create_mk_file(&dir, "lmkd_only.mk", content);

        let update = SectionUpdate::for_category(
            Category::Chimera,
            SectionChange::Merge(map(&[("c", "1")])),
        );
        let report = apply_section_updates(&path, &[update]).unwrap();
        assert!(!report.changed_anything());
        assert_eq!(report.skipped, vec!["# Chimera property".to_string()]);
        assert_eq!(fs::read_to_string(&path).unwrap(), content);
    }

    #[test]
    fn test_replace_copies_block_wholesale() {
        let dir = TempDir::new().unwrap();
        let path = create_mk_file(
            &dir,
            "target.mk",
            "# top\n# LMKD property\nold=1\n# Chimera property\nc=1\n",
        );
        let block = vec![
            "# LMKD property\n".to_string(),
            "PRODUCT_PROPERTY_OVERRIDES += \\\n".to_string(),
            "    new=2".to_string(),
        ];
        let update = SectionUpdate::for_category(Category::Lmkd, SectionChange::Replace(block));
        apply_section_updates(&path, &[update]).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "# top\n# LMKD property\nPRODUCT_PROPERTY_OVERRIDES += \\\n    new=2\n# Chimera property\nc=1\n"
        );
    }

    #[test]
    fn test_back_to_back_edits_keep_every_backup() {
        let dir = TempDir::new().unwrap();
        let path = create_mk_file(&dir, "device.mk", "# LMKD property
a=1
");

        let first = SectionUpdate::for_category(Category::Lmkd, SectionChange::Merge(map(&[("a", "2")])));
        let second = SectionUpdate::for_category(Category::Lmkd, SectionChange::Merge(map(&[("a", "3")])));
        let one = apply_section_updates(&path, &[first]).unwrap();
        let two = apply_section_updates(&path, &[second]).unwrap();

        assert_ne!(one.backup, two.backup);
        assert_eq!(backups_of(&path), vec![one.backup.clone(), two.backup.clone()]);
        assert_eq!(fs::read_to_string(&one.backup).unwrap(), "# LMKD property
a=1
");
        assert_eq!(fs::read_to_string(&two.backup).unwrap(), "# LMKD property
a=2
");
        assert_eq!(fs::read_to_string(&path).unwrap(), "# LMKD property
a=3
");
    }

    #[test]
    fn test_missing_file_fails_at_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.mk");
        let update = SectionUpdate::for_category(
            Category::Lmkd,
            SectionChange::Merge(map(&[("a", "1")])),
        );
        let err = apply_section_updates(&path, &[update]).unwrap_err();
        assert!(matches!(err, EditError::Backup { .. }));
        assert!(!path.exists());
        assert!(backups_of(&path).is_empty());
    }
}
