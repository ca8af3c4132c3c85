mod common;

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use vcardqr::matrix::Module;
use vcardqr::render::RenderStyle;
use vcardqr::{encode, QrCode, QrCodeEcc};

fn ecc_level() -> impl Strategy<Value = QrCodeEcc> {
    prop_oneof![
        Just(QrCodeEcc::Low),
        Just(QrCodeEcc::Medium),
        Just(QrCodeEcc::Quartile),
        Just(QrCodeEcc::High),
    ]
}

proptest! {
    #[test]
    fn finished_matrix_is_complete(data in prop::collection::vec(any::<u8>(), 0..300), ecl in ecc_level()) {
        let qr = QrCode::encode_binary(&data, ecl).unwrap();
        let version = qr.version();
        prop_assert_eq!(qr.size(), 4 * i32::from(version.value()) + 17);
        prop_assert_eq!(qr.matrix().unset_count(), 0);
        prop_assert!(qr.matrix().cells().all(|m| !matches!(m, Module::Reserved(_))));
        prop_assert_eq!(qr.decode_format(), Some((ecl, qr.mask())));
        prop_assert!(version.byte_capacity(ecl) >= data.len());
        if version.value() > 1 {
            let smaller = vcardqr::version::Version::new(version.value() - 1);
            prop_assert!(smaller.byte_capacity(ecl) < data.len());
        }
    }

    #[test]
    fn encoding_is_deterministic(data in prop::collection::vec(any::<u8>(), 0..120), ecl in ecc_level()) {
        let a = QrCode::encode_binary(&data, ecl).unwrap();
        let b = QrCode::encode_binary(&data, ecl).unwrap();
        prop_assert_eq!(a, b);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn rendered_symbol_decodes(data in prop::collection::vec(any::<u8>(), 0..160), ecl in ecc_level()) {
        let encoded = encode(&data, ecl, &RenderStyle::default().with_module_size(3)).unwrap();
        let decoded = common::decode_one(&encoded.raster).map_err(TestCaseError::fail)?;
        prop_assert_eq!(decoded, data);
    }
}
