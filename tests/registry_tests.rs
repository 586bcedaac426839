use mp4tree::boxes::FourCC;
use mp4tree::registry::{
    decode_ftyp, decode_hdlr, decode_iods, decode_mdhd, decode_mvhd, decode_smhd, decode_stsd,
    decode_tkhd, decode_vmhd, default_registry,
};
use mp4tree::FieldError;

fn mvhd_payload() -> Vec<u8> {
    let mut v = vec![0, 0, 0, 0]; // version 0, flags 0
    v.extend_from_slice(&1u32.to_be_bytes()); // creation_time
    v.extend_from_slice(&2u32.to_be_bytes()); // modification_time
    v.extend_from_slice(&1000u32.to_be_bytes()); // timescale
    v.extend_from_slice(&5000u32.to_be_bytes()); // duration
    v.extend_from_slice(&0x0001_8000u32.to_be_bytes()); // rate 1.5
    v.extend_from_slice(&0x0100u16.to_be_bytes()); // volume 1.0
    v.extend_from_slice(&[0u8; 10]); // reserved
    v.extend_from_slice(&[0u8; 36]); // matrix
    v.extend_from_slice(&[0u8; 24]); // pre_defined
    v.extend_from_slice(&3u32.to_be_bytes()); // next_track_id
    v
}

fn tkhd_payload() -> Vec<u8> {
    let mut v = vec![0, 0, 0, 3]; // enabled | in_movie
    v.extend_from_slice(&10u32.to_be_bytes()); // creation_time
    v.extend_from_slice(&20u32.to_be_bytes()); // modification_time
    v.extend_from_slice(&7u32.to_be_bytes()); // track_id
    v.extend_from_slice(&[0u8; 4]); // reserved
    v.extend_from_slice(&4000u32.to_be_bytes()); // duration
    v.extend_from_slice(&[0u8; 8]); // reserved
    v.extend_from_slice(&(-1i16).to_be_bytes()); // layer
    v.extend_from_slice(&2i16.to_be_bytes()); // alternate_group
    v.extend_from_slice(&0x0080u16.to_be_bytes()); // volume 0.5
    v.extend_from_slice(&[0u8; 2]); // reserved
    for m in [0x0001_0000u32, 0, 0, 0, 0x0001_0000, 0, 0, 0, 0x4000_0000] {
        v.extend_from_slice(&m.to_be_bytes());
    }
    v.extend_from_slice(&(1920u32 << 16).to_be_bytes());
    v.extend_from_slice(&((1080u32 << 16) | 0x8000).to_be_bytes());
    v
}

#[test]
fn ftyp_brands() {
    let f = decode_ftyp(b"isom0000isomiso2avc1mp41").unwrap();
    assert_eq!(f.major_brand, FourCC(*b"isom"));
    assert_eq!(f.minor_version, FourCC(*b"0000"));
    let brands: Vec<_> = f.compatible_brands.iter().map(|b| b.to_string()).collect();
    assert_eq!(brands, ["isom", "iso2", "avc1", "mp41"]);
}

#[test]
fn ftyp_partial_brand_is_error() {
    let err = decode_ftyp(b"isom0000iso").unwrap_err();
    assert_eq!(
        err,
        FieldError::OutOfBounds {
            field: "compatible_brands",
            offset: 8,
            end: 12,
            available: 11,
        }
    );
}

#[test]
fn mvhd_fields() {
    let m = decode_mvhd(&mvhd_payload()).unwrap();
    assert_eq!(m.version, 0);
    assert_eq!(m.flags, [0, 0, 0]);
    assert_eq!(m.creation_time, 1);
    assert_eq!(m.modification_time, 2);
    assert_eq!(m.timescale, 1000);
    assert_eq!(m.duration, 5000);
    assert_eq!(m.rate.to_string(), "1.5");
    assert_eq!(m.volume.to_string(), "1.0");
    assert_eq!(m.next_track_id, 3);
    assert_eq!(m.duration_seconds(), Some(5.0));
}

#[test]
fn mvhd_short_payload() {
    let payload = mvhd_payload();
    let err = decode_mvhd(&payload[..25]).unwrap_err();
    assert!(matches!(err, FieldError::OutOfBounds { field: "volume", .. }));

    let err = decode_mvhd(&payload[..99]).unwrap_err();
    assert!(matches!(err, FieldError::OutOfBounds { field: "next_track_id", .. }));
}

#[test]
fn mvhd_version_1_is_rejected() {
    let mut payload = mvhd_payload();
    payload[0] = 1;
    assert_eq!(decode_mvhd(&payload), Err(FieldError::UnsupportedVersion(1)));
}

#[test]
fn tkhd_mdhd_version_1_is_rejected() {
    let mut tkhd = tkhd_payload();
    tkhd[0] = 1;
    assert_eq!(decode_tkhd(&tkhd), Err(FieldError::UnsupportedVersion(1)));

    let mut mdhd = vec![1, 0, 0, 0];
    mdhd.extend_from_slice(&[0u8; 32]);
    assert_eq!(decode_mdhd(&mdhd), Err(FieldError::UnsupportedVersion(1)));
}

#[test]
fn tkhd_fields() {
    let t = decode_tkhd(&tkhd_payload()).unwrap();
    assert_eq!(t.flags, [0, 0, 3]);
    assert_eq!(t.track_id, 7);
    assert_eq!(t.duration, 4000);
    assert_eq!(t.layer, -1);
    assert_eq!(t.alternate_group, 2);
    assert_eq!(t.volume.to_string(), "0.5");
    assert_eq!(t.matrix[0].to_f64(), 1.0);
    assert_eq!(t.matrix[4].to_f64(), 1.0);
    assert_eq!(t.matrix[8].raw(), 0x4000_0000);
    assert_eq!(t.width.to_string(), "1920.0");
    assert_eq!(t.height.to_string(), "1080.5");
}

#[test]
fn tkhd_missing_height() {
    let payload = tkhd_payload();
    let err = decode_tkhd(&payload[..80]).unwrap_err();
    assert_eq!(
        err,
        FieldError::OutOfBounds {
            field: "height",
            offset: 80,
            end: 84,
            available: 80,
        }
    );
}

#[test]
fn mdhd_language() {
    let mut v = vec![0, 0, 0, 0];
    v.extend_from_slice(&0u32.to_be_bytes());
    v.extend_from_slice(&0u32.to_be_bytes());
    v.extend_from_slice(&90000u32.to_be_bytes());
    v.extend_from_slice(&180000u32.to_be_bytes());
    // "eng" = 5, 14, 7 with the pad bit set
    v.extend_from_slice(&(0x8000u16 | (5 << 10) | (14 << 5) | 7).to_be_bytes());
    v.extend_from_slice(&[0, 0]);

    let m = decode_mdhd(&v).unwrap();
    assert_eq!(m.timescale, 90000);
    assert_eq!(m.duration_seconds(), Some(2.0));
    assert!(m.language.pad);
    assert_eq!(m.language.code, (5 << 10) | (14 << 5) | 7);
    assert_eq!(m.language.to_iso639(), "eng");

    // pre_defined is optional, the language is not
    assert!(decode_mdhd(&v[..22]).is_ok());
    assert!(decode_mdhd(&v[..21]).is_err());
}

#[test]
fn hdlr_name_trailing_nul() {
    let mut v = vec![0, 0, 0, 0];
    v.extend_from_slice(&0u32.to_be_bytes());
    v.extend_from_slice(b"soun");
    v.extend_from_slice(&[0u8; 12]);
    v.extend_from_slice(b"SoundHandler\0");

    let h = decode_hdlr(&v).unwrap();
    assert_eq!(h.handler_type, FourCC(*b"soun"));
    assert_eq!(h.track_name, "SoundHandler");

    let h = decode_hdlr(&v[..24]).unwrap();
    assert_eq!(h.track_name, "");
}

#[test]
fn vmhd_smhd() {
    let v = [0, 0, 0, 1, 0, 0x40, 0, 1, 0, 2, 0, 3];
    let vmhd = decode_vmhd(&v).unwrap();
    assert_eq!(vmhd.flags, [0, 0, 1]);
    assert_eq!(vmhd.graphicsmode, 0x40);
    assert_eq!(vmhd.opcolor, [1, 2, 3]);
    assert!(decode_vmhd(&v[..11]).is_err());

    let s = decode_smhd(&[0, 0, 0, 0, 0xFF, 0x00, 0, 0]).unwrap();
    assert_eq!(s.balance, -256);
}

#[test]
fn stsd_keeps_entries_raw() {
    let mut v = vec![0, 0, 0, 0];
    v.extend_from_slice(&1u32.to_be_bytes());
    v.extend_from_slice(&16u32.to_be_bytes());
    v.extend_from_slice(b"avc1");
    v.extend_from_slice(&[0u8; 8]);

    let s = decode_stsd(&v).unwrap();
    assert_eq!(s.entry_count, 1);
    assert_eq!(s.entries.len(), 16);
    assert_eq!(&s.entries[4..8], b"avc1");
}

#[test]
fn iods_is_opaque_blob() {
    let i = decode_iods(&[0x10, 0x80, 0x80]).unwrap();
    assert_eq!(i.data, [0x10, 0x80, 0x80]);
}

#[test]
fn default_registry_covers_known_tags() {
    let reg = default_registry();
    for tag in [
        "ftyp", "moov", "mvhd", "iods", "trak", "tkhd", "mdia", "mdhd", "hdlr", "minf", "vmhd",
        "smhd", "stbl", "stsd",
    ] {
        let cc: FourCC = tag.parse().unwrap();
        assert!(reg.contains(&cc), "missing {tag}");
        assert_eq!(reg.name(&cc), Some(tag));
    }
    assert!(!reg.contains(&FourCC(*b"mdat")));
    assert!(!reg.contains(&FourCC(*b"free")));
}
