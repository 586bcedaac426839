//! Container decoders. Each scans its own content region, decodes only the
//! child types it has a slot for and drops everything else.

use crate::boxes::{BoxHeader, DecodedBox, FourCC, Mdia, Minf, Moov, Node, Stbl, Trak};
use crate::error::Result;
use crate::known_boxes::KnownBox;
use crate::parser::Walker;
use tracing::warn;

pub(crate) const MOOV_CHILDREN: &[KnownBox] = &[KnownBox::Mvhd, KnownBox::Iods, KnownBox::Trak];
pub(crate) const TRAK_CHILDREN: &[KnownBox] = &[KnownBox::Tkhd, KnownBox::Mdia];
pub(crate) const MDIA_CHILDREN: &[KnownBox] = &[KnownBox::Mdhd, KnownBox::Hdlr, KnownBox::Minf];
pub(crate) const MINF_CHILDREN: &[KnownBox] = &[KnownBox::Vmhd, KnownBox::Smhd, KnownBox::Stbl];
// stts/stsc/stsz/stco and friends are skipped
pub(crate) const STBL_CHILDREN: &[KnownBox] = &[KnownBox::Stsd];

/// Fill a singular slot; a later box of the same type wins.
pub(crate) fn replace<T>(slot: &mut Option<T>, typ: FourCC, value: T) {
    if slot.replace(value).is_some() {
        warn!(%typ, "duplicate box, keeping the later one");
    }
}

pub(crate) fn moov(hdr: BoxHeader, w: &mut Walker<'_>) -> Result<DecodedBox> {
    let mut moov = Moov::default();
    w.for_each_child(&hdr, MOOV_CHILDREN, |child| {
        match child {
            DecodedBox::Mvhd(n) => replace(&mut moov.mvhd, n.header.typ, n),
            DecodedBox::Iods(n) => replace(&mut moov.iods, n.header.typ, n),
            DecodedBox::Trak(n) => moov.traks.push(n),
            other => return Some(other),
        }
        None
    })?;
    Ok(DecodedBox::Moov(Node::valid(hdr, moov)))
}

pub(crate) fn trak(hdr: BoxHeader, w: &mut Walker<'_>) -> Result<DecodedBox> {
    let mut trak = Trak::default();
    w.for_each_child(&hdr, TRAK_CHILDREN, |child| {
        match child {
            DecodedBox::Tkhd(n) => replace(&mut trak.tkhd, n.header.typ, n),
            DecodedBox::Mdia(n) => replace(&mut trak.mdia, n.header.typ, n),
            other => return Some(other),
        }
        None
    })?;
    Ok(DecodedBox::Trak(Node::valid(hdr, trak)))
}

pub(crate) fn mdia(hdr: BoxHeader, w: &mut Walker<'_>) -> Result<DecodedBox> {
    let mut mdia = Mdia::default();
    w.for_each_child(&hdr, MDIA_CHILDREN, |child| {
        match child {
            DecodedBox::Mdhd(n) => replace(&mut mdia.mdhd, n.header.typ, n),
            DecodedBox::Hdlr(n) => replace(&mut mdia.hdlr, n.header.typ, n),
            DecodedBox::Minf(n) => replace(&mut mdia.minf, n.header.typ, n),
            other => return Some(other),
        }
        None
    })?;
    Ok(DecodedBox::Mdia(Node::valid(hdr, mdia)))
}

pub(crate) fn minf(hdr: BoxHeader, w: &mut Walker<'_>) -> Result<DecodedBox> {
    let mut minf = Minf::default();
    w.for_each_child(&hdr, MINF_CHILDREN, |child| {
        match child {
            DecodedBox::Vmhd(n) => replace(&mut minf.vmhd, n.header.typ, n),
            DecodedBox::Smhd(n) => replace(&mut minf.smhd, n.header.typ, n),
            DecodedBox::Stbl(n) => replace(&mut minf.stbl, n.header.typ, n),
            other => return Some(other),
        }
        None
    })?;
    Ok(DecodedBox::Minf(Node::valid(hdr, minf)))
}

pub(crate) fn stbl(hdr: BoxHeader, w: &mut Walker<'_>) -> Result<DecodedBox> {
    let mut stbl = Stbl::default();
    w.for_each_child(&hdr, STBL_CHILDREN, |child| match child {
        DecodedBox::Stsd(n) => {
            replace(&mut stbl.stsd, n.header.typ, n);
            None
        }
        other => Some(other),
    })?;
    Ok(DecodedBox::Stbl(Node::valid(hdr, stbl)))
}
