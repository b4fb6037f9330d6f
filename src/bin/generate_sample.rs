use std::fs::File;
use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const HEADERS: [&str; 8] = [
    "Full Name",
    "WHAT IS YOUR NATIONAL ID?",
    "Phone Number",
    "County",
    "Gender",
    "Age",
    "WHAT IS THE MAIN INDUSTRY SECTOR IN WHICH YOU OPERATE IN?",
    "IS YOUR BUSINESS REGISTERED?",
];

const FIRST_NAMES: [&str; 10] = [
    "Jane", "Mary", "Grace", "Faith", "Joyce", "Esther", "Wanjiku", "Akinyi", "Chebet", "Mwende",
];
const LAST_NAMES: [&str; 8] = [
    "Otieno", "Wanjiru", "Kamau", "Mutua", "Kiptoo", "Achieng", "Njeri", "Mohamed",
];
const COUNTIES: [&str; 6] = ["Nairobi", "Kisumu", "Mombasa", "Nakuru", "Machakos", "Kiambu"];
const SECTORS: [&str; 5] = ["Agriculture", "Retail", "Manufacturing", "Transport", "Services"];

/// SplitMix64 stream; the same seed always yields the same participants.
struct SampleRng(u64);

impl SampleRng {
    fn seeded(seed: u64) -> Self {
        SampleRng(seed)
    }

    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len() as u64) as usize]
    }
}

struct Participant {
    full_name: String,
    national_id: i64,
    phone_number: String,
    county: &'static str,
    gender: &'static str,
    age: i64,
    sector: &'static str,
    registered: &'static str,
}

impl Participant {
    fn random(rng: &mut SampleRng, seq: i64) -> Self {
        let full_name = format!("{} {}", rng.pick(&FIRST_NAMES), rng.pick(&LAST_NAMES));
        Participant {
            full_name,
            national_id: 20_000_000 + seq * 7_919 % 9_000_000,
            phone_number: format!("07{:08}", rng.below(100_000_000)),
            county: rng.pick(&COUNTIES),
            gender: if rng.below(10) < 8 { "Female" } else { "Male" },
            age: 18 + rng.below(30) as i64,
            sector: rng.pick(&SECTORS),
            registered: if rng.below(2) == 0 { "Yes" } else { "No" },
        }
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn inline_cell(text: &str) -> String {
    format!(r#"<c t="inlineStr"><is><t>{}</t></is></c>"#, xml_escape(text))
}

fn number_cell(v: i64) -> String {
    format!("<c><v>{v}</v></c>")
}

/// Write a one-sheet workbook. National IDs and ages are numeric cells;
/// phone numbers are text so their leading zero survives.
fn write_xlsx(path: &str, rows: &[Participant]) -> Result<()> {
    let mut sheet = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row>"#,
    );
    for h in HEADERS {
        sheet.push_str(&inline_cell(h));
    }
    sheet.push_str("</row>");
    for p in rows {
        sheet.push_str("<row>");
        sheet.push_str(&inline_cell(&p.full_name));
        sheet.push_str(&number_cell(p.national_id));
        sheet.push_str(&inline_cell(&p.phone_number));
        sheet.push_str(&inline_cell(p.county));
        sheet.push_str(&inline_cell(p.gender));
        sheet.push_str(&number_cell(p.age));
        sheet.push_str(&inline_cell(p.sector));
        sheet.push_str(&inline_cell(p.registered));
        sheet.push_str("</row>");
    }
    sheet.push_str("</sheetData></worksheet>");

    let parts = [
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#.to_string(),
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#.to_string(),
        ),
        (
            "xl/workbook.xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Participants" sheetId="1" r:id="rId1"/></sheets></workbook>"#.to_string(),
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#.to_string(),
        ),
        ("xl/worksheets/sheet1.xml", sheet),
    ];

    let file = File::create(path).with_context(|| format!("creating {path}"))?;
    let mut zip = ZipWriter::new(file);
    for (name, content) in &parts {
        zip.start_file(*name, SimpleFileOptions::default())?;
        zip.write_all(content.as_bytes())?;
    }
    zip.finish().context("finishing xlsx archive")?;
    Ok(())
}

fn write_csv(path: &str, rows: &[Participant]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record(HEADERS)?;
    for p in rows {
        let id = p.national_id.to_string();
        let age = p.age.to_string();
        writer.write_record([
            p.full_name.as_str(),
            id.as_str(),
            p.phone_number.as_str(),
            p.county,
            p.gender,
            age.as_str(),
            p.sector,
            p.registered,
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &str, rows: &[Participant]) -> Result<()> {
    let text = |f: fn(&Participant) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    let columns: Vec<ArrayRef> = vec![
        text(|p| &p.full_name),
        Arc::new(Int64Array::from(rows.iter().map(|p| p.national_id).collect::<Vec<_>>())),
        text(|p| &p.phone_number),
        text(|p| p.county),
        text(|p| p.gender),
        Arc::new(Int64Array::from(rows.iter().map(|p| p.age).collect::<Vec<_>>())),
        text(|p| p.sector),
        text(|p| p.registered),
    ];

    let schema = Arc::new(Schema::new(
        HEADERS
            .iter()
            .zip(&columns)
            .map(|(name, col)| Field::new(*name, col.data_type().clone(), false))
            .collect::<Vec<_>>(),
    ));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SampleRng::seeded(42);
    let rows: Vec<Participant> = (0..500).map(|i| Participant::random(&mut rng, i)).collect();

    write_xlsx("sample_participants.xlsx", &rows)?;
    write_csv("sample_participants.csv", &rows)?;
    write_parquet("sample_participants.parquet", &rows)?;

    println!(
        "Wrote {} participants to sample_participants.{{xlsx,csv,parquet}}",
        rows.len()
    );
    if let Some(first) = rows.first() {
        println!(
            "Try: county={} id={} phone={}",
            first.county, first.national_id, first.phone_number
        );
    }
    Ok(())
}
