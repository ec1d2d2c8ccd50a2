use camino::Utf8PathBuf;
use silogen::{Builder, CancelToken, CompileFlags};

fn new_builder(xml: &str) -> Builder {
    let mut builder = Builder::new();
    builder.import_xml(xml);
    builder
}

#[test]
fn ensure_writes_then_reuses_cache() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache: Utf8PathBuf = Utf8PathBuf::from_path_buf(dir.path().join("cache.silo")).unwrap();

    let mut builder = new_builder("<root><a/></root>");
    let first = builder
        .ensure(&cache, CompileFlags::NONE, &CancelToken::never())
        .expect("first ensure compiles and writes");
    let metadata_len = std::fs::metadata(cache.as_std_path()).unwrap().len();
    assert_eq!(metadata_len as usize, first.as_bytes().len());

    let second = builder
        .ensure(&cache, CompileFlags::NONE, &CancelToken::never())
        .expect("second ensure reuses the in-memory silo");
    assert_eq!(first.guid(), second.guid());
}

#[test]
fn ensure_recompiles_when_inputs_change() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache: Utf8PathBuf = Utf8PathBuf::from_path_buf(dir.path().join("cache.silo")).unwrap();

    let mut builder = new_builder("<root><a/></root>");
    let first = builder
        .ensure(&cache, CompileFlags::NONE, &CancelToken::never())
        .unwrap();

    let mut changed = new_builder("<root><a/><b/></root>");
    let second = changed
        .ensure(&cache, CompileFlags::NONE, &CancelToken::never())
        .unwrap();

    assert_ne!(first.guid(), second.guid());
}

#[test]
fn ensure_reads_a_cache_written_by_a_different_builder() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache: Utf8PathBuf = Utf8PathBuf::from_path_buf(dir.path().join("cache.silo")).unwrap();

    let mut writer = new_builder("<root><a/></root>");
    let written = writer
        .ensure(&cache, CompileFlags::NONE, &CancelToken::never())
        .unwrap();

    let mut reader = new_builder("<root><a/></root>");
    let reused = reader
        .ensure(&cache, CompileFlags::NONE, &CancelToken::never())
        .expect("guid matches so the cache is reused without recompiling");
    assert_eq!(written.guid(), reused.guid());
}
