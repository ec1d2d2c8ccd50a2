use silogen::cancel::CancelToken;
use silogen::error::SiloError;
use silogen::silo::{Silo, MAGIC};
use silogen::{Builder, CompileFlags};

#[test]
fn truncated_bytes_yield_bad_magic_not_a_panic() {
    let err = Silo::from_bytes(vec![1, 2, 3]).unwrap_err();
    assert!(matches!(err, SiloError::BadMagic));
}

#[test]
fn wrong_magic_yields_bad_magic() {
    let mut bytes = vec![0u8; 64];
    bytes[0..4].copy_from_slice(b"NOPE");
    let err = Silo::from_bytes(bytes).unwrap_err();
    assert!(matches!(err, SiloError::BadMagic));
}

#[test]
fn unsupported_version_is_reported() {
    let mut bytes = vec![0u8; 64];
    bytes[0..4].copy_from_slice(&MAGIC);
    bytes[4..8].copy_from_slice(&99u32.to_le_bytes());
    let err = Silo::from_bytes(bytes).unwrap_err();
    assert!(matches!(err, SiloError::BadVersion(99)));
}

#[test]
fn a_pre_cancelled_token_aborts_before_touching_output() {
    let mut builder = Builder::new();
    builder.import_xml("<root><a/></root>");
    let cancel = CancelToken::new();
    cancel.cancel();

    let err = builder.compile(CompileFlags::NONE, &cancel).unwrap_err();
    assert!(matches!(err.downcast_ref::<SiloError>(), Some(SiloError::Cancelled)));
}
