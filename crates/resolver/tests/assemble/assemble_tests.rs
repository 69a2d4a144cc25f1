use super::*;
use protocol::models::{DiskSize, IconHandle};

fn paths(result: &[Candidate]) -> Vec<PathBuf> {
    result.iter().map(|candidate| candidate.path.clone()).collect()
}

#[test]
fn collapse_keeps_only_the_topmost_path() {
    let collapsed = collapse_paths(vec![
        PathBuf::from("/A/B/C"),
        PathBuf::from("/A"),
        PathBuf::from("/A/B"),
    ]);

    assert_eq!(collapsed, vec![PathBuf::from("/A")]);
}

#[test]
fn collapse_respects_component_boundaries() {
    let collapsed = collapse_paths(vec![
        PathBuf::from("/Lib/Foo"),
        PathBuf::from("/Lib/Foobar"),
        PathBuf::from("/Lib/Foo/inner"),
        PathBuf::from("/Lib/Foo-1"),
        PathBuf::from("/Lib/Foobar"),
    ]);

    assert_eq!(
        collapsed,
        vec![
            PathBuf::from("/Lib/Foo"),
            PathBuf::from("/Lib/Foo-1"),
            PathBuf::from("/Lib/Foobar"),
        ]
    );
}

#[test]
fn collapsed_results_have_no_nested_pairs() {
    let names = ["a", "a-b", "ab", "a.b"];
    let mut raw = Vec::new();
    for first in names {
        raw.push(PathBuf::from("/r").join(first));
        for second in names {
            raw.push(PathBuf::from("/r").join(first).join(second));
            raw.push(PathBuf::from("/r").join(second).join(first).join("x"));
        }
    }
    raw.reverse();

    let collapsed = collapse_paths(raw);

    for left in &collapsed {
        for right in &collapsed {
            assert!(
                left == right || !right.starts_with(left),
                "{right:?} is nested under {left:?}"
            );
        }
    }
    assert_eq!(collapsed.len(), names.len());
}

#[test]
fn detects_trash_components() {
    assert!(is_in_trash(Path::new("/Users/me/.Trash/Widget.app")));
    assert!(is_in_trash(Path::new("/Volumes/Disk/.Trashes/501/Widget.app")));
    assert!(!is_in_trash(Path::new("/Users/me/Trash/Widget.app")));
    assert!(!is_in_trash(Path::new("/Users/me/.Trashcan")));
}

#[tokio::test]
async fn lone_trash_survivor_clears_forward_result() {
    let result = finalize_forward(
        vec![Candidate::new("/Users/me/.Trash/Widget.app", true)],
        None,
    )
    .await;
    assert!(result.is_empty());

    let result = finalize_forward(
        vec![
            Candidate::new("/Users/me/.Trash/Widget.app", true),
            Candidate::new("/Users/me/Library/Caches/widget", true),
        ],
        None,
    )
    .await;
    assert_eq!(result.len(), 2);
}

struct FixedProbe;

impl SizeProbe for FixedProbe {
    fn probe(&self, path: &Path) -> Option<PathMetrics> {
        if path.ends_with("missing") {
            return None;
        }
        Some(PathMetrics {
            size: DiskSize {
                real_bytes: 4096,
                logical_bytes: 10,
            },
            icon: Some(IconHandle(path.join("icon.icns"))),
        })
    }
}

#[tokio::test]
async fn forward_result_carries_sizes_and_totals() {
    let result = finalize_forward(
        vec![
            Candidate::new("/x/b", false),
            Candidate::new("/x/a", true),
            Candidate::new("/x/a/inner", false),
            Candidate::new("/x/missing", false),
        ],
        Some(Arc::new(FixedProbe)),
    )
    .await;

    assert_eq!(
        paths(&result.candidates),
        vec![
            PathBuf::from("/x/a"),
            PathBuf::from("/x/b"),
            PathBuf::from("/x/missing"),
        ]
    );
    assert_eq!(result.total_real_bytes, 8192);
    assert_eq!(result.total_logical_bytes, 20);
    assert_eq!(
        result.candidates[0].icon,
        Some(IconHandle(PathBuf::from("/x/a/icon.icns")))
    );
    assert!(result.candidates[2].size.is_none());
}

#[test]
fn orphan_result_is_collapsed_and_marks_cancellation() {
    let result = finalize_orphans(
        vec![
            Candidate::new("/lib/junk/inner", false),
            Candidate::new("/lib/junk", true),
        ],
        true,
    );

    assert_eq!(paths(&result.candidates), vec![PathBuf::from("/lib/junk")]);
    assert!(result.cancelled);
}
