//! GenBank flat-file codec for region hierarchies.
//!
//! Writing translates every span into record-local coordinates so the emitted
//! record is self-contained from position zero; parsing rebuilds the hierarchy
//! and recovers the aggregate region attributes from the re-parsed children.
//! On-disk coordinates are 1-based inclusive, in-memory spans are 0-based
//! half-open.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::cds::CdsFeature;
use crate::cluster::{Cluster, SuperClusterKind};
use crate::error::Error;
use crate::feature::GenericFeature;
use crate::location::FeatureLocation;
use crate::record::{ClusterId, Record, RegionId};
use crate::strand::Strand;
use crate::subregion::SubRegion;

/// Qualifiers emitted without surrounding quotes.
const BARE_QUALIFIERS: [&str; 4] = ["region_number", "cutoff", "neighbourhood_range", "probability"];

/// Sibling features sharing a start coordinate keep a fixed kind order.
fn type_rank(feature_type: &str) -> u8 {
    match feature_type {
        "region" => 0,
        "supercluster" => 1,
        "cluster" => 2,
        "subregion" => 3,
        "CDS" => 4,
        _ => 5,
    }
}

fn format_location(location: &FeatureLocation) -> String {
    let span = format!("{}..{}", location.start() + 1, location.end());
    if location.strand().is_reverse() {
        format!("complement({span})")
    } else {
        span
    }
}

fn parse_location(text: &str) -> Result<FeatureLocation, Error> {
    let text = text.trim();
    let (inner, strand) = match text
        .strip_prefix("complement(")
        .and_then(|t| t.strip_suffix(')'))
    {
        Some(inner) => (inner, Strand::Reverse),
        None => (text, Strand::Unknown),
    };
    let (start_text, end_text) = inner
        .split_once("..")
        .ok_or_else(|| Error::Parse(format!("invalid feature location: '{text}'")))?;
    let start: i32 = start_text
        .trim()
        .parse()
        .map_err(|_| Error::Parse(format!("invalid location start: '{text}'")))?;
    let end: i32 = end_text
        .trim()
        .parse()
        .map_err(|_| Error::Parse(format!("invalid location end: '{text}'")))?;
    FeatureLocation::new(start - 1, end, strand)
}

// ── Writing ──────────────────────────────────────────────

/// Serialize one region and everything nested in it as a single GenBank
/// record, with every span shifted down by `record_start_offset`.
pub fn write_region<W: Write>(
    record: &Record,
    region: RegionId,
    record_start_offset: i32,
    writer: &mut W,
) -> Result<(), Error> {
    if record_start_offset < 0 {
        return Err(Error::Validation(format!(
            "record start offset must be non-negative, got {record_start_offset}"
        )));
    }
    let offset = record_start_offset;
    let envelope = record.region_location(region).translate(offset)?;
    let region_obj = record.region(region);
    let mut record_end = envelope.end();

    let mut features: Vec<GenericFeature> = Vec::new();

    let mut feature = GenericFeature::new(envelope, "region");
    feature
        .qualifiers
        .push("region_number", &region.number().to_string());
    for product in record.region_products(region) {
        feature.qualifiers.push("product", &product);
    }
    features.push(feature);

    // Clusters reachable through the region's superclusters, ascending start;
    // /candidates indices refer to this order.
    let mut cluster_ids: Vec<ClusterId> = Vec::new();
    for supercluster in region_obj.superclusters() {
        for member in record.supercluster(*supercluster).members() {
            if !cluster_ids.contains(member) {
                cluster_ids.push(*member);
            }
        }
    }
    cluster_ids.sort_by_key(|id| {
        let location = record.cluster(*id).location();
        (location.start(), location.end())
    });

    for id in &cluster_ids {
        let cluster = record.cluster(*id);
        let mut feature = GenericFeature::new(cluster.location().translate(offset)?, "cluster");
        // the neighbourhood may reach past the emitted record's start; clamp it
        let neighbourhood = cluster.neighbourhood_location();
        let clamped = FeatureLocation::new(
            (neighbourhood.start() - offset).max(0),
            neighbourhood.end() - offset,
            neighbourhood.strand(),
        )?;
        record_end = record_end.max(clamped.end());
        feature.qualifiers.push("tool", cluster.tool());
        feature.qualifiers.push("product", cluster.product());
        feature.qualifiers.push("cutoff", &cluster.cutoff().to_string());
        feature
            .qualifiers
            .push("neighbourhood_range", &cluster.neighbourhood_range().to_string());
        feature
            .qualifiers
            .push("neighbourhood", &format_location(&clamped));
        feature
            .qualifiers
            .push("detection_rule", cluster.detection_rule());
        features.push(feature);
    }

    for supercluster in region_obj.superclusters() {
        let location = record.supercluster_location(*supercluster).translate(offset)?;
        let mut feature = GenericFeature::new(location, "supercluster");
        feature
            .qualifiers
            .push("kind", record.supercluster(*supercluster).kind().as_str());
        let indices: Vec<String> = record
            .supercluster(*supercluster)
            .members()
            .iter()
            .map(|member| {
                let position = cluster_ids.iter().position(|id| id == member).unwrap();
                (position + 1).to_string()
            })
            .collect();
        feature.qualifiers.push("candidates", &indices.join(","));
        features.push(feature);
    }

    for id in region_obj.subregions() {
        let subregion = record.subregion(*id);
        let mut feature = GenericFeature::new(subregion.location().translate(offset)?, "subregion");
        feature.qualifiers.push("tool", subregion.tool());
        if let Some(probability) = subregion.probability() {
            feature
                .qualifiers
                .push("probability", &probability.to_string());
        }
        features.push(feature);
    }

    for id in region_obj.cds_children() {
        let cds = record.cds(*id);
        let mut feature = GenericFeature::new(cds.location().translate(offset)?, "CDS");
        feature.qualifiers.push("locus_tag", cds.locus_tag());
        features.push(feature);
    }

    features.sort_by_key(|f| (f.location.start(), f.location.end(), type_rank(&f.feature_type)));

    let name = record.id();
    writeln!(
        writer,
        "LOCUS       {name}    {record_end} bp    DNA     linear   UNK 01-JAN-1980"
    )?;
    writeln!(writer, "DEFINITION  {name} region {}.", region.number())?;
    writeln!(writer, "ACCESSION   {name}")?;
    writeln!(writer, "FEATURES             Location/Qualifiers")?;
    for feature in &features {
        writeln!(
            writer,
            "     {:<16}{}",
            feature.feature_type,
            format_location(&feature.location)
        )?;
        for (qualifier, values) in feature.qualifiers.iter() {
            for value in values {
                if BARE_QUALIFIERS.contains(&qualifier) {
                    writeln!(writer, "                     /{qualifier}={value}")?;
                } else {
                    writeln!(writer, "                     /{qualifier}=\"{value}\"")?;
                }
            }
        }
    }

    writeln!(writer, "ORIGIN")?;
    let sequence = record.sequence();
    let slice_start = (offset as usize).min(sequence.len());
    let slice_end = ((offset + record_end) as usize).min(sequence.len());
    let slice = &sequence[slice_start..slice_end];
    for (i, line_chunk) in slice.chunks(60).enumerate() {
        write!(writer, "{:>9}", i * 60 + 1)?;
        for block in line_chunk.chunks(10) {
            write!(writer, " ")?;
            writer.write_all(&block.to_ascii_lowercase())?;
        }
        writeln!(writer)?;
    }
    writeln!(writer, "//")?;
    Ok(())
}

/// [`write_region`] to a file path.
pub fn write_region_to_path(
    record: &Record,
    region: RegionId,
    record_start_offset: i32,
    path: &Path,
) -> Result<(), Error> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_region(record, region, record_start_offset, &mut writer)?;
    writer.flush()?;
    Ok(())
}

// ── Parsing ──────────────────────────────────────────────

/// Parse a GenBank file, gzip-decoding when the path ends in `.gz`.
pub fn read_genbank(path: &Path) -> Result<Vec<Record>, Error> {
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        parse_genbank_gz(file)
    } else {
        parse_genbank(BufReader::new(file))
    }
}

/// Parse a gzip-compressed GenBank stream.
pub fn parse_genbank_gz<R: Read>(reader: R) -> Result<Vec<Record>, Error> {
    parse_genbank(BufReader::new(GzDecoder::new(reader)))
}

/// Parse GenBank from a buffered reader, one [`Record`] per LOCUS entry.
///
/// Record boundaries are isolated before detailed parsing; a malformed record
/// is rejected wholesale rather than partially reconstructed.
pub fn parse_genbank<R: BufRead>(reader: R) -> Result<Vec<Record>, Error> {
    let mut records = Vec::new();
    let mut current: Vec<String> = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if current.is_empty() {
            if line.trim().is_empty() {
                continue;
            }
            if !line.starts_with("LOCUS") {
                return Err(Error::Parse(format!(
                    "expected LOCUS, got: '{}'",
                    &line[..line.len().min(20)]
                )));
            }
            current.push(line);
        } else if line.starts_with("//") {
            records.push(parse_record(&current)?);
            current.clear();
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        return Err(Error::Parse(
            "unexpected EOF before record terminator".to_string(),
        ));
    }
    Ok(records)
}

fn parse_record(lines: &[String]) -> Result<Record, Error> {
    let mut record_id = lines[0]
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| Error::Parse("LOCUS line missing record name".to_string()))?
        .to_string();

    // header: pick up ACCESSION, stop at the feature table
    let mut features_start = None;
    for (index, line) in lines.iter().enumerate().skip(1) {
        let tag = if line.len() >= 12 {
            line[..12].trim()
        } else {
            line.trim()
        };
        if tag == "ACCESSION" && line.len() > 12 {
            let rest = line[12..].trim();
            if !rest.is_empty() {
                record_id = rest.to_string();
            }
        } else if tag == "FEATURES" {
            features_start = Some(index + 1);
            break;
        }
    }
    let mut i = features_start
        .ok_or_else(|| Error::Parse(format!("no FEATURES table in record '{record_id}'")))?;

    // feature table, then sequence block
    let mut features: Vec<GenericFeature> = Vec::new();
    let mut last_qualifier: Option<String> = None;
    let mut sequence: Vec<u8> = Vec::new();
    while i < lines.len() {
        let line = &lines[i];
        if line.starts_with("ORIGIN") {
            for sequence_line in &lines[i + 1..] {
                for byte in sequence_line.bytes() {
                    if byte.is_ascii_alphabetic() {
                        sequence.push(byte.to_ascii_uppercase());
                    }
                }
            }
            break;
        }
        let tag = if line.len() >= 21 {
            line[..21].trim()
        } else {
            line.trim()
        };
        let content = if line.len() > 21 { line[21..].trim() } else { "" };
        if !tag.is_empty() {
            features.push(GenericFeature::new(parse_location(content)?, tag));
            last_qualifier = None;
        } else if let Some(qualifier) = content.strip_prefix('/') {
            let feature = features.last_mut().ok_or_else(|| {
                Error::Format(format!(
                    "qualifier line before any feature in record '{record_id}'"
                ))
            })?;
            let (name, value) = match qualifier.split_once('=') {
                Some((name, value)) => (name, value.trim_matches('"')),
                None => (qualifier, ""),
            };
            feature.qualifiers.push(name, value);
            last_qualifier = Some(name.to_string());
        } else if !content.is_empty() {
            // wrapped qualifier value
            let name = last_qualifier.as_deref().ok_or_else(|| {
                Error::Format(format!(
                    "unexpected continuation line in record '{record_id}': '{content}'"
                ))
            })?;
            if let Some(feature) = features.last_mut() {
                feature
                    .qualifiers
                    .append_to_last_value(name, content.trim_matches('"'));
            }
        }
        i += 1;
    }

    build_record(&record_id, sequence, features)
}

/// Rebuild the typed hierarchy from the generic features of one record.
fn build_record(
    record_id: &str,
    sequence: Vec<u8>,
    features: Vec<GenericFeature>,
) -> Result<Record, Error> {
    let mut cluster_features = Vec::new();
    let mut supercluster_features = Vec::new();
    let mut subregion_features = Vec::new();
    let mut region_features = Vec::new();
    let mut cds_features = Vec::new();
    for feature in features {
        match feature.feature_type.as_str() {
            "cluster" => cluster_features.push(feature),
            "supercluster" => supercluster_features.push(feature),
            "subregion" => subregion_features.push(feature),
            "region" => region_features.push(feature),
            "CDS" => cds_features.push(feature),
            // foreign features (source, gene, ...) are not part of the hierarchy
            _ => {}
        }
    }
    if region_features.len() != 1 {
        return Err(Error::Format(format!(
            "record '{record_id}' must contain exactly one region feature, found {}",
            region_features.len()
        )));
    }

    let mut record = Record::new(record_id, sequence);

    let mut cluster_ids = Vec::new();
    for feature in &cluster_features {
        let cluster = Cluster::new(
            feature.location,
            parse_location(required(feature, "neighbourhood")?)?,
            required(feature, "tool")?,
            required(feature, "product")?,
            required_number(feature, "cutoff")?,
            required_number(feature, "neighbourhood_range")?,
            required(feature, "detection_rule")?,
        )?;
        cluster_ids.push(record.add_cluster(cluster));
    }

    let mut supercluster_ids = Vec::new();
    for feature in &supercluster_features {
        let kind: SuperClusterKind = required(feature, "kind")?.parse()?;
        let mut members = Vec::new();
        for index_text in required(feature, "candidates")?.split(',') {
            let index: usize = index_text.trim().parse().map_err(|_| {
                Error::Format(format!(
                    "supercluster candidate index '{}' is not a number",
                    index_text.trim()
                ))
            })?;
            let member = index
                .checked_sub(1)
                .and_then(|i| cluster_ids.get(i))
                .copied()
                .ok_or_else(|| {
                    Error::Format(format!(
                        "supercluster candidate index {index} has no matching cluster"
                    ))
                })?;
            members.push(member);
        }
        supercluster_ids.push(record.add_supercluster(kind, members)?);
    }

    let mut subregion_ids = Vec::new();
    for feature in &subregion_features {
        let probability = match feature.qualifiers.first("probability") {
            Some(text) => Some(text.parse::<f64>().map_err(|_| {
                Error::Format(format!("subregion probability '{text}' is not a number"))
            })?),
            None => None,
        };
        let subregion = SubRegion::new(feature.location, required(feature, "tool")?, probability)?;
        subregion_ids.push(record.add_subregion(subregion));
    }

    let region = record.add_region(supercluster_ids, subregion_ids)?;

    // re-attaching through propagation rebuilds the aggregate attributes
    // (envelope, products, probabilities, per-child CDS lists)
    for feature in &cds_features {
        let cds = CdsFeature::new(feature.location, required(feature, "locus_tag")?);
        record.add_cds(region, cds)?;
    }

    Ok(record)
}

fn required<'a>(feature: &'a GenericFeature, name: &str) -> Result<&'a str, Error> {
    feature.qualifiers.first(name).ok_or_else(|| {
        Error::Format(format!(
            "{} feature at {}..{} missing required /{name}",
            feature.feature_type,
            feature.location.start() + 1,
            feature.location.end()
        ))
    })
}

fn required_number<T: std::str::FromStr>(
    feature: &GenericFeature,
    name: &str,
) -> Result<T, Error> {
    let text = required(feature, name)?;
    text.parse().map_err(|_| {
        Error::Format(format!(
            "{} feature has malformed /{name}: '{text}'",
            feature.feature_type
        ))
    })
}
