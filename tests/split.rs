use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use sffsplit::{
    AdaptorTable, CommonHeader, ContainerReader, ContainerWriter, Record, RecordData,
    RecordHeader, SplitConfig, Splitter, UNMATCHED,
};

const FLOW: &[u8] = b"TACGTACGTACGTACGTACGTACGTACGTACG";
const KEY: &[u8] = b"TCAG";
const ADAPTORS: [(&str, &[u8]); 4] = [
    ("MID1", b"ACGAGTGCGT"),
    ("MID2", b"ACGCTCGACA"),
    ("MID3", b"AGACGCACTC"),
    ("short", b"TGTACT"),
];

fn random_bases(rng: &mut SmallRng, len: usize) -> Vec<u8> {
    (0..len).map(|_| b"ACGT"[rng.random_range(0..4)]).collect()
}

/// Builds a read whose adaptor region holds `prefix`, followed by random bases
fn make_record(
    rng: &mut SmallRng,
    common: &CommonHeader,
    idx: usize,
    prefix: &[u8],
) -> Result<Record> {
    let mut bases = KEY.to_vec();
    bases.extend_from_slice(prefix);
    let tail_len = rng.random_range(20..80);
    bases.extend(random_bases(rng, tail_len));

    let nbases = bases.len() as u32;
    let clip = (KEY.len() + prefix.len() + 1) as u16;
    let header = RecordHeader::new(format!("READ{idx:05}").as_bytes(), nbases)?
        .clip_quality(5, nbases as u16)
        .clip_adapter(clip, 0);

    let mut data = RecordData::new(common.flow_len, nbases);
    data.flowgram = (0..common.flow_len)
        .map(|_| rng.random_range(0..400))
        .collect();
    data.flow_index = (0..nbases).map(|_| rng.random_range(0..4)).collect();
    data.bases = bases;
    data.quality = (0..nbases).map(|_| rng.random_range(10..41)).collect();
    Ok(Record::new(common, header, data)?)
}

/// Writes an input container and returns the expected adaptor name of each record
fn write_input(path: &Path, n_records: usize, seed: u64) -> Result<Vec<String>> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let common = CommonHeader::new(FLOW, KEY)?.with_nreads(n_records as u32);
    let mut writer = ContainerWriter::new(BufWriter::new(File::create(path)?));
    writer.write_common_header(&common)?;

    let mut expected = Vec::with_capacity(n_records);
    for idx in 0..n_records {
        let choice = rng.random_range(0..ADAPTORS.len() + 1);
        let (name, prefix) = match ADAPTORS.get(choice) {
            Some((name, sequence)) => (name.to_string(), sequence.to_vec()),
            None => (UNMATCHED.to_string(), b"CCCCCCCCCC".to_vec()),
        };
        writer.write_record(&make_record(&mut rng, &common, idx, &prefix)?)?;
        expected.push(name);
    }
    writer.finish()?.flush()?;
    Ok(expected)
}

fn write_adaptors(path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    writeln!(file, "barcodes")?;
    for (name, sequence) in ADAPTORS {
        writeln!(file, "{name}\t{}", String::from_utf8_lossy(sequence))?;
    }
    Ok(())
}

fn read_names(path: &Path) -> Result<(CommonHeader, Vec<String>)> {
    let mut reader = ContainerReader::new(BufReader::new(File::open(path)?));
    let common = reader.read_common_header()?;
    let mut names = Vec::new();
    while let Some(record) = reader.next_record(&common) {
        names.push(record?.name().into_owned());
    }
    Ok((common, names))
}

fn split_files(
    dir: &Path,
    config: SplitConfig,
    n_records: usize,
    seed: u64,
) -> Result<(Vec<String>, HashMap<String, PathBuf>)> {
    let input = dir.join("input.sff");
    let adaptors = dir.join("adaptors.txt");
    let expected = write_input(&input, n_records, seed)?;
    write_adaptors(&adaptors)?;

    let table = AdaptorTable::from_path(&adaptors)?;
    assert_eq!(table.len(), ADAPTORS.len());

    let stem = dir.join("split");
    let factory = |name: &str| -> sffsplit::Result<BufWriter<File>> {
        let path = dir.join(format!("split.{name}.sff"));
        Ok(File::create(path).map(BufWriter::new)?)
    };
    let mut splitter = Splitter::new(table, config, factory)?;
    let report = splitter.run(BufReader::new(File::open(&input)?))?;
    assert_eq!(report.total_records, n_records);

    let outputs = report
        .outputs
        .iter()
        .map(|output| {
            let path = PathBuf::from(format!("{}.{}.sff", stem.display(), output.name));
            (output.name.clone(), path)
        })
        .collect();
    Ok((expected, outputs))
}

#[test]
fn test_split_conserves_records() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = SplitConfig::new(0, 32, 4)?;
    let (expected, outputs) = split_files(dir.path(), config, 500, 1)?;

    let mut total = 0;
    for (name, path) in &outputs {
        let (common, names) = read_names(path)?;
        assert_eq!(common.nreads as usize, names.len());
        total += names.len();

        // every read lands in its adaptor's output, in input order
        let want: Vec<String> = expected
            .iter()
            .enumerate()
            .filter(|(_, adaptor)| *adaptor == name)
            .map(|(idx, _)| format!("READ{idx:05}"))
            .collect();
        assert_eq!(names, want);
    }
    assert_eq!(total, 500);
    Ok(())
}

#[test]
fn test_thread_count_does_not_change_output() -> Result<()> {
    let single = tempfile::tempdir()?;
    let multi = tempfile::tempdir()?;
    let (_, single_outputs) = split_files(single.path(), SplitConfig::new(0, 10, 1)?, 200, 9)?;
    let (_, multi_outputs) = split_files(multi.path(), SplitConfig::new(0, 64, 8)?, 200, 9)?;

    assert_eq!(single_outputs.len(), multi_outputs.len());
    for (name, path) in &single_outputs {
        let other = &multi_outputs[name];
        assert_eq!(std::fs::read(path)?, std::fs::read(other)?);
    }
    Ok(())
}

#[test]
fn test_fuzzy_split() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("input.sff");
    let mut rng = SmallRng::seed_from_u64(3);
    let common = CommonHeader::new(FLOW, KEY)?.with_nreads(3);
    let mut writer = ContainerWriter::new(BufWriter::new(File::create(&input)?));
    writer.write_common_header(&common)?;
    // one substitution, one deletion, and far from everything
    writer.write_record(&make_record(&mut rng, &common, 0, b"ACGAGTGCGA")?)?;
    writer.write_record(&make_record(&mut rng, &common, 1, b"ACGCTCGAC")?)?;
    writer.write_record(&make_record(&mut rng, &common, 2, b"GGGGGGGGGG")?)?;
    writer.finish()?.flush()?;

    let adaptors = dir.path().join("adaptors.txt");
    write_adaptors(&adaptors)?;
    let factory = |name: &str| -> sffsplit::Result<BufWriter<File>> {
        Ok(File::create(dir.path().join(format!("{name}.sff"))).map(BufWriter::new)?)
    };
    let mut splitter = Splitter::new(
        AdaptorTable::from_path(&adaptors)?,
        SplitConfig::new(1, 100, 2)?,
        factory,
    )?;
    let report = splitter.run(BufReader::new(File::open(&input)?))?;
    assert_eq!(report.unmatched, 1);
    assert_eq!(report.output("MID1").map(|o| o.records), Some(1));
    assert_eq!(report.output("MID2").map(|o| o.records), Some(1));

    let (_, names) = read_names(&dir.path().join("unmatched.sff"))?;
    assert_eq!(names, vec!["READ00002"]);
    Ok(())
}

#[test]
fn test_truncated_input_fails() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("input.sff");
    write_input(&input, 20, 5)?;
    let bytes = std::fs::read(&input)?;
    std::fs::write(&input, &bytes[..bytes.len() - 13])?;

    let factory = |name: &str| -> sffsplit::Result<BufWriter<File>> {
        Ok(File::create(dir.path().join(format!("{name}.sff"))).map(BufWriter::new)?)
    };
    let adaptors = dir.path().join("adaptors.txt");
    write_adaptors(&adaptors)?;
    let mut splitter = Splitter::new(
        AdaptorTable::from_path(&adaptors)?,
        SplitConfig::default(),
        factory,
    )?;
    let result = splitter.run(BufReader::new(File::open(&input)?));
    assert!(matches!(result, Err(sffsplit::Error::ReadError(_))));
    assert_eq!(splitter.state(), sffsplit::SplitState::Failed);
    Ok(())
}
