use std::{
    cmp,
    collections::BTreeMap,
    fs::File,
    io::{stdout, BufReader, Read, Write},
    path::Path,
};

use anyhow::{anyhow, Context, Result};
use handlebars::handlebars_helper;
use hifitime::Epoch;
use satframe::{
    frame::read_frames,
    spacepacket::{Apid, Packet},
    timecode::MissionTimeDecoder,
};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone)]
pub enum Format {
    Json,
    Text,
}

impl clap::ValueEnum for Format {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Json, Self::Text]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::Json => Some(clap::builder::PossibleValue::new("json")),
            Self::Text => Some(clap::builder::PossibleValue::new("text")),
        }
    }
}

#[derive(Default, Debug, Clone, Serialize)]
struct Summary {
    total_packets: usize,
    first_met_ms: Option<u64>,
    last_met_ms: Option<u64>,
    first_packet_time: Option<Epoch>,
    last_packet_time: Option<Epoch>,
}

impl Summary {
    fn add(&mut self, met: Option<u64>, decoder: Option<&MissionTimeDecoder>) {
        self.total_packets += 1;
        let Some(met) = met else {
            return;
        };
        self.first_met_ms = Some(self.first_met_ms.map_or(met, |cur| cmp::min(met, cur)));
        self.last_met_ms = Some(self.last_met_ms.map_or(met, |cur| cmp::max(met, cur)));
        if let Some(decoder) = decoder {
            self.first_packet_time = self.first_met_ms.map(|ms| decoder.epoch_of(ms));
            self.last_packet_time = self.last_met_ms.map(|ms| decoder.epoch_of(ms));
        }
    }
}

#[derive(Default, Debug, Clone, Serialize)]
struct Frames {
    accepted: u64,
    rejected: u64,
    /// Accepted payloads that do not hold a complete space packet
    not_packets: u64,
    idle_packets: u64,
}

#[derive(Debug, Clone, Serialize)]
struct Info {
    filename: String,
    frames: Frames,
    summary: Summary,
    apids: BTreeMap<Apid, Summary>,
}

fn summarize<R: Read>(src: R, filename: String, epoch: Option<Epoch>) -> Result<Info> {
    let decoder = epoch.map(MissionTimeDecoder::new);
    let mut frames = Frames::default();
    let mut summary = Summary::default();
    let mut apids: BTreeMap<Apid, Summary> = BTreeMap::default();

    let mut payloads = read_frames(src);
    for payload in &mut payloads {
        let payload = payload.context("reading frames")?;
        let Some(packet) = Packet::decode(&payload) else {
            debug!(len = payload.len(), "payload is not a space packet");
            frames.not_packets += 1;
            continue;
        };
        if packet.is_idle() {
            frames.idle_packets += 1;
            continue;
        }
        let met = packet.secondary_header().map(|h| h.mission_time_ms);
        summary.add(met, decoder.as_ref());
        apids
            .entry(packet.header.apid)
            .or_default()
            .add(met, decoder.as_ref());
    }
    frames.accepted = payloads.accepted();
    frames.rejected = payloads.rejected();

    Ok(Info {
        filename,
        frames,
        summary,
        apids,
    })
}

pub fn info(fpath: &Path, format: &Format, epoch: Option<Epoch>) -> Result<()> {
    let src = BufReader::new(File::open(fpath).context("opening input")?);
    let info = summarize(src, fpath.to_string_lossy().to_string(), epoch)?;

    match format {
        Format::Json => {
            serde_json::to_writer_pretty(stdout(), &info).context("serializing to json")
        }
        Format::Text => {
            let data = render_text(&info).context("serializing info")?;
            stdout()
                .write_all(data.as_bytes())
                .context("writing to stdout")
        }
    }
}

fn render_text(info: &Info) -> Result<String> {
    handlebars_helper!(left_pad: |num: u64, v: Json| {
        let v = match v {
            serde_json::Value::String(s) => s.to_owned(),
            serde_json::Value::Null => String::new(),
            _ => v.to_string()
        };
        let width = usize::try_from(num).unwrap_or_default();
        format!("{v:>width$}")
    });
    let mut hb = handlebars::Handlebars::new();
    hb.register_helper("lpad", Box::new(left_pad));
    hb.register_template_string("info", TEXT_TEMPLATE)
        .map_err(|err| anyhow!("compiling template: {err}"))?;

    hb.render("info", &info).context("rendering text")
}

const TEXT_TEMPLATE: &str = r"{{ filename }}
===============================================================================================
Accepted: {{ frames.accepted }}
Rejected: {{ frames.rejected }}
Idle:     {{ frames.idle_packets }}
Other:    {{ frames.not_packets }}
Packets:  {{ summary.total_packets }}
First:    {{ summary.first_met_ms }} {{ summary.first_packet_time }}
Last:     {{ summary.last_met_ms }} {{ summary.last_packet_time }}
-----------------------------------------------------------------------------------------------
APID    Count   First MET (ms)   Last MET (ms)   First                         Last
-----------------------------------------------------------------------------------------------
{{ #each apids }}{{ lpad 4 @key }}  {{ lpad 7 total_packets }}  {{ lpad 15 first_met_ms }}  {{ lpad 14 last_met_ms }}   {{ first_packet_time }}   {{ last_packet_time }}
{{/each }}
";
