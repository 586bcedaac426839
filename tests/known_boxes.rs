use mp4tree::boxes::FourCC;
use mp4tree::known_boxes::KnownBox;

#[test]
fn known_box_from_ftyp() {
    let cc = FourCC(*b"ftyp");
    let kb = KnownBox::from(cc);
    assert!(matches!(kb, KnownBox::Ftyp));
    assert_eq!(kb.full_name(), "File Type Box");
}

#[test]
fn known_box_classifies_container() {
    for tag in [b"moov", b"trak", b"mdia", b"minf", b"stbl"] {
        assert!(KnownBox::from(FourCC(*tag)).is_container());
    }

    let ftyp = KnownBox::from(FourCC(*b"ftyp"));
    assert!(!ftyp.is_container());
    let stsd = KnownBox::from(FourCC(*b"stsd"));
    assert!(!stsd.is_container());
}

#[test]
fn only_trak_repeats() {
    assert!(KnownBox::from(FourCC(*b"trak")).is_repeatable());
    assert!(!KnownBox::from(FourCC(*b"mvhd")).is_repeatable());
}

#[test]
fn unknown_keeps_fourcc() {
    let cc = FourCC(*b"wide");
    assert_eq!(KnownBox::from(cc), KnownBox::Unknown(cc));
    assert_eq!(KnownBox::from(cc).full_name(), "Unknown Box");
}

#[test]
fn fourcc_parse_and_lossy_text() {
    assert_eq!("moov".parse::<FourCC>(), Ok(FourCC(*b"moov")));
    assert!("moo".parse::<FourCC>().is_err());
    assert!("moovs".parse::<FourCC>().is_err());
    assert_eq!(FourCC([b'a', 0, b'c', 0xFF]).to_string(), "a.c.");
}
