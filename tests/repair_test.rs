//! End-to-end repair tests: real files on disk, backup then save.

use std::fs;
use std::path::{Path, PathBuf};

use nbt_depth::error::Error;
use nbt_depth::repair::repair;
use nbt_depth::{
    AnalysisConfig, Compression, NbtFile, ProblematicNode, Scalar, Tag, TagKind, analyze, read_tree,
    write_tree,
};
use tempfile::TempDir;

// ============================================================================
// Fixtures
// ============================================================================

/// `{ Entities: [shallow, shallow, deep, deep], Version: 3 }`, where each deep
/// entity is a chain of `levels` single-key compounds.
fn world(levels: usize) -> NbtFile {
    let mut deep = Tag::Leaf(Scalar::Byte(1));
    for i in 0..levels {
        deep = Tag::compound([(format!("n{i}"), deep)]);
    }
    let shallow = Tag::compound([("id", Scalar::String("minecraft:pig".into()).into())]);
    let entities =
        Tag::list(TagKind::Compound, vec![shallow.clone(), shallow, deep.clone(), deep]).unwrap();
    NbtFile {
        name: String::new(),
        root: Tag::compound([("Entities", entities), ("Version", Scalar::Int(3).into())]),
        compression: Compression::Gzip,
    }
}

fn write_world(dir: &TempDir, file: &NbtFile) -> PathBuf {
    let path = dir.path().join("level.dat");
    write_tree(file, &path).unwrap();
    path
}

fn backups(dir: &Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|p| p.to_string_lossy().contains(".backup_"))
        .collect()
}

// ============================================================================
// Repair Tests
// ============================================================================

#[test]
fn test_repair_backs_up_then_saves_reduced_tree() {
    let dir = TempDir::new().unwrap();
    let path = write_world(&dir, &world(40));
    let original = fs::read(&path).unwrap();

    let mut file = read_tree(&path).unwrap();
    let config = AnalysisConfig { warning_depth: 20 };
    let analysis = analyze(&file.root, &config);
    assert_eq!(analysis.max_depth, 42);
    assert!(analysis.max_path.to_string().starts_with("Entities > [2] > n39 > n38"));
    let flagged: Vec<String> = analysis.problematic.iter().map(|p| p.path.to_string()).collect();
    assert_eq!(flagged, ["Entities"]);

    let outcome = repair(&path, &mut file, &analysis).unwrap();
    assert!(outcome.written);
    assert_eq!(outcome.reduction.applied, 1);
    assert!(outcome.reduction.skipped.is_empty());

    // backup holds the original bytes
    assert_eq!(backups(dir.path()), [outcome.backup.clone()]);
    assert_eq!(fs::read(&outcome.backup).unwrap(), original);

    // the saved file keeps its wrapper and list kind, and is shallower
    let saved = read_tree(&path).unwrap();
    assert_eq!(saved.compression, Compression::Gzip);
    let entities = saved.root.as_compound().unwrap()["Entities"].as_list().unwrap();
    assert_eq!(entities.elem(), TagKind::Compound);
    assert_eq!(entities.len(), 2);
    let after = analyze(&saved.root, &config);
    assert_eq!(after.max_depth, 3);
    assert!(after.problematic.is_empty());
}

#[test]
fn test_repair_without_successful_splices_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let path = write_world(&dir, &world(5));
    let original = fs::read(&path).unwrap();

    let mut file = read_tree(&path).unwrap();
    let mut analysis = analyze(&file.root, &AnalysisConfig::default());
    analysis.problematic.push(ProblematicNode {
        path: ["Entities", "Missing"].into_iter().map(Into::into).collect(),
        level: 2,
        max_depth: 150,
    });

    let outcome = repair(&path, &mut file, &analysis).unwrap();
    assert!(!outcome.written);
    assert_eq!(outcome.reduction.applied, 0);
    assert_eq!(outcome.reduction.skipped.len(), 1);
    assert!(outcome.backup.exists());
    assert_eq!(fs::read(&path).unwrap(), original);
}

#[test]
fn test_repair_fails_before_mutation_when_backup_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.dat");
    let mut file = world(30);
    let before = file.clone();
    let analysis = analyze(&file.root, &AnalysisConfig { warning_depth: 10 });
    assert!(!analysis.problematic.is_empty());

    let err = repair(&path, &mut file, &analysis).unwrap_err();
    assert!(matches!(err, Error::Backup { .. }));
    assert_eq!(file, before);
    assert!(!path.exists());
}

#[test]
fn test_write_error_names_the_backup() {
    let err = Error::Write {
        path: PathBuf::from("level.dat"),
        backup: PathBuf::from("level.dat.backup_20240101000000"),
        source: std::io::Error::other("disk full").into(),
    };
    let message = err.to_string();
    assert!(message.contains("failed to save level.dat"));
    assert!(message.contains("preserved at level.dat.backup_20240101000000"));
}

#[test]
fn test_load_error_for_missing_file() {
    let dir = TempDir::new().unwrap();
    assert!(read_tree(&dir.path().join("nope.dat")).is_err());
}
