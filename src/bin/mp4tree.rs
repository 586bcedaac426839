use anyhow::Context;
use clap::{ArgAction, Parser};
use mp4tree::{
    boxes::{BoxHeader, Mdia, Minf, Moov, Node, Stbl, Trak},
    known_boxes::KnownBox,
    parse_file,
    util::hex_dump,
    ByteSource, Diagnostic,
};
use serde::Serialize;
use std::fmt::Display;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Decode the box tree of an MP4/ISOBMFF file")]
struct Args {
    /// MP4/ISOBMFF file path
    path: String,

    /// Emit JSON instead of a human-readable tree
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Hex-dump raw blobs (iods, stsd entries, the start of mdat)
    #[arg(long, action = ArgAction::SetTrue)]
    raw: bool,

    /// More log output (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

// bytes of mdat shown by --raw
const MDAT_PREVIEW: u64 = 64;

#[derive(Serialize)]
struct JsonOutput<'a, T: Serialize> {
    file: &'a T,
    diagnostics: &'a [Diagnostic],
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let (file, diagnostics) =
        parse_file(&args.path).with_context(|| format!("parsing {}", args.path))?;

    if args.json {
        let out = JsonOutput {
            file: &file,
            diagnostics: &diagnostics,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{} ({} bytes)", args.path, file.len);
    let p = Printer { raw: args.raw };
    if let Some(ftyp) = &file.ftyp {
        p.node(0, ftyp, |f| {
            let brands: Vec<String> = f.compatible_brands.iter().map(|b| b.to_string()).collect();
            format!(
                "major={} minor={} compatible=[{}]",
                f.major_brand,
                f.minor_version,
                brands.join(",")
            )
        });
    }
    if let Some(moov) = &file.moov {
        p.moov(moov);
    }
    if let Some(mdat) = &file.mdat {
        p.line(0, mdat, "");
        if args.raw {
            let head = mdat.content_len().min(MDAT_PREVIEW);
            let bytes = file.source().read_at(mdat.content_start(), head as usize)?;
            p.dump(0, &bytes, mdat.content_start());
        }
    }

    if !diagnostics.is_empty() {
        println!();
        println!("{} diagnostic(s):", diagnostics.len());
        for d in &diagnostics {
            println!("  {d}");
        }
    }
    Ok(())
}

struct Printer {
    raw: bool,
}

impl Printer {
    fn line(&self, depth: usize, hdr: &BoxHeader, summary: impl Display) {
        let kb = KnownBox::from(hdr.typ);
        let kind = if kb.is_container() { "container" } else { "leaf" };
        println!(
            "{:indent$}{} @{} size={} [{}] {} {}",
            "",
            hdr.typ,
            hdr.start,
            hdr.size,
            kind,
            kb.full_name(),
            summary,
            indent = depth * 2
        );
    }

    /// Print one node; invalid nodes show their error instead of a summary.
    fn node<'n, T>(
        &self,
        depth: usize,
        n: &'n Node<T>,
        summary: impl FnOnce(&T) -> String,
    ) -> Option<&'n T> {
        match n.get() {
            Some(v) => {
                self.line(depth, &n.header, summary(v));
                Some(v)
            }
            None => {
                let err = n.error().map(|e| e.to_string()).unwrap_or_default();
                self.line(depth, &n.header, format!("<invalid: {err}>"));
                None
            }
        }
    }

    fn dump(&self, depth: usize, bytes: &[u8], offset: u64) {
        if !self.raw || bytes.is_empty() {
            return;
        }
        for l in hex_dump(bytes, offset).lines() {
            println!("{:indent$}{}", "", l, indent = depth * 2 + 2);
        }
    }

    fn moov(&self, n: &Node<Moov>) {
        let Some(moov) = self.node(0, n, |_| String::new()) else {
            return;
        };
        if let Some(mvhd) = &moov.mvhd {
            self.node(1, mvhd, |m| {
                format!(
                    "timescale={} duration={} rate={} volume={} next_track_id={}",
                    m.timescale, m.duration, m.rate, m.volume, m.next_track_id
                )
            });
        }
        if let Some(iods) = &moov.iods {
            if let Some(v) = self.node(1, iods, |i| format!("{} bytes", i.data.len())) {
                self.dump(1, &v.data, iods.header.content_start());
            }
        }
        for trak in &moov.traks {
            self.trak(trak);
        }
    }

    fn trak(&self, n: &Node<Trak>) {
        let Some(trak) = self.node(1, n, |_| String::new()) else {
            return;
        };
        if let Some(tkhd) = &trak.tkhd {
            self.node(2, tkhd, |t| {
                format!(
                    "track_id={} duration={} layer={} alternate_group={} volume={} width={} height={}",
                    t.track_id, t.duration, t.layer, t.alternate_group, t.volume, t.width, t.height
                )
            });
        }
        if let Some(mdia) = &trak.mdia {
            self.mdia(mdia);
        }
    }

    fn mdia(&self, n: &Node<Mdia>) {
        let Some(mdia) = self.node(2, n, |_| String::new()) else {
            return;
        };
        if let Some(mdhd) = &mdia.mdhd {
            self.node(3, mdhd, |m| {
                format!(
                    "timescale={} duration={} language={}",
                    m.timescale, m.duration, m.language
                )
            });
        }
        if let Some(hdlr) = &mdia.hdlr {
            self.node(3, hdlr, |h| {
                format!("handler={} name={:?}", h.handler_type, h.track_name)
            });
        }
        if let Some(minf) = &mdia.minf {
            self.minf(minf);
        }
    }

    fn minf(&self, n: &Node<Minf>) {
        let Some(minf) = self.node(3, n, |_| String::new()) else {
            return;
        };
        if let Some(vmhd) = &minf.vmhd {
            self.node(4, vmhd, |v| {
                format!("graphicsmode={} opcolor={:?}", v.graphicsmode, v.opcolor)
            });
        }
        if let Some(smhd) = &minf.smhd {
            self.node(4, smhd, |s| format!("balance={}", s.balance));
        }
        if let Some(stbl) = &minf.stbl {
            self.stbl(stbl);
        }
    }

    fn stbl(&self, n: &Node<Stbl>) {
        let Some(stbl) = self.node(4, n, |_| String::new()) else {
            return;
        };
        if let Some(stsd) = &stbl.stsd {
            let summary = |s: &mp4tree::boxes::Stsd| {
                format!("entry_count={} ({} raw bytes)", s.entry_count, s.entries.len())
            };
            if let Some(v) = self.node(5, stsd, summary) {
                // version/flags + entry_count precede the entries
                self.dump(5, &v.entries, stsd.header.content_start() + 8);
            }
        }
    }
}
