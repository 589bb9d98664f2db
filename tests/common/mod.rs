use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Writes a minimal xlsx package. Cells that parse as numbers are stored as
/// numeric values, empty strings are left out, everything else is an inline string.
pub fn write_xlsx(path: &Path, sheets: &[(&str, &[&[&str]])]) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    let mut workbook = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
    ));
    let mut relationships = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    ));
    for (index, (name, _)) in sheets.iter().enumerate() {
        let id = index + 1;
        workbook.push_str(&format!(r#"<sheet name="{}" sheetId="{id}" r:id="rId{id}"/>"#, escape(name)));
        relationships.push_str(&format!(
            r#"<Relationship Id="rId{id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{id}.xml"/>"#
        ));
    }
    workbook.push_str("</sheets></workbook>");
    relationships.push_str("</Relationships>");

    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        r#"<Default Extension="xml" ContentType="application/xml"/></Types>"#,
    ).as_bytes()).unwrap();
    zip.start_file("xl/workbook.xml", options).unwrap();
    zip.write_all(workbook.as_bytes()).unwrap();
    zip.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
    zip.write_all(relationships.as_bytes()).unwrap();

    for (index, (_, rows)) in sheets.iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", index + 1), options).unwrap();
        zip.write_all(worksheet(rows).as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

fn worksheet(rows: &[&[&str]]) -> String {
    let mut xml = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    ));
    for (row, values) in rows.iter().enumerate() {
        xml.push_str(&format!(r#"<row r="{}">"#, row + 1));
        for (col, value) in values.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let reference = format!("{}{}", column_name(col), row + 1);
            if value.parse::<f64>().is_ok() {
                xml.push_str(&format!(r#"<c r="{reference}"><v>{value}</v></c>"#));
            } else {
                xml.push_str(&format!(r#"<c r="{reference}" t="inlineStr"><is><t>{}</t></is></c>"#, escape(value)));
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

fn column_name(mut col: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    name.reverse();
    String::from_utf8(name).unwrap()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

// BIFF8 record types
const BOF: u16 = 0x0809;
const EOF: u16 = 0x000A;
const BOUND_SHEET8: u16 = 0x0085;
const SST: u16 = 0x00FC;
const LABEL_SST: u16 = 0x00FD;
const NUMBER: u16 = 0x0203;

// Compound file sector ids
const FAT_SECTOR: u32 = 0xFFFF_FFFD;
const END_OF_CHAIN: u32 = 0xFFFF_FFFE;
const FREE_SECTOR: u32 = 0xFFFF_FFFF;
const SECTOR: usize = 512;

/// Writes a minimal Excel 97-2003 workbook: a BIFF8 `Workbook` stream with a
/// shared string table, wrapped in a version 3 compound file. Cells follow the
/// same rules as [`write_xlsx`].
pub fn write_xls(path: &Path, sheets: &[(&str, &[&[&str]])]) {
    std::fs::write(path, compound_file(&workbook_stream(sheets))).unwrap();
}

fn record(kind: u16, payload: &[u8]) -> Vec<u8> {
    assert!(payload.len() <= 8224, "record needs CONTINUE");
    let mut bytes = kind.to_le_bytes().to_vec();
    bytes.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

fn utf16(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

fn bof(kind: u16) -> Vec<u8> {
    let mut payload = vec![0u8; 16];
    payload[0..2].copy_from_slice(&0x0600u16.to_le_bytes());
    payload[2..4].copy_from_slice(&kind.to_le_bytes());
    record(BOF, &payload)
}

fn bound_sheet(name: &str, pointer: usize) -> Vec<u8> {
    let mut payload = (pointer as u32).to_le_bytes().to_vec();
    // visible worksheet, wide characters
    payload.extend_from_slice(&[0, 0, name.encode_utf16().count() as u8, 1]);
    payload.extend(utf16(name));
    record(BOUND_SHEET8, &payload)
}

fn workbook_stream(sheets: &[(&str, &[&[&str]])]) -> Vec<u8> {
    let mut strings: Vec<&str> = Vec::new();
    let mut bodies = Vec::with_capacity(sheets.len());
    for (_, rows) in sheets {
        let mut body = bof(0x0010);
        for (row, values) in rows.iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let mut payload = [(row as u16).to_le_bytes(), (col as u16).to_le_bytes(), 0u16.to_le_bytes()].concat();
                if let Ok(number) = value.parse::<f64>() {
                    payload.extend_from_slice(&number.to_le_bytes());
                    body.extend(record(NUMBER, &payload));
                } else {
                    let index = match strings.iter().position(|string| string == value) {
                        Some(index) => index,
                        None => {
                            strings.push(*value);
                            strings.len() - 1
                        }
                    };
                    payload.extend_from_slice(&(index as u32).to_le_bytes());
                    body.extend(record(LABEL_SST, &payload));
                }
            }
        }
        body.extend(record(EOF, &[]));
        bodies.push(body);
    }

    let count = (strings.len() as u32).to_le_bytes();
    let mut table = [count, count].concat();
    for string in &strings {
        table.extend_from_slice(&(string.encode_utf16().count() as u16).to_le_bytes());
        table.push(1);
        table.extend(utf16(string));
    }
    let table = record(SST, &table);

    let mut stream = bof(0x0005);
    let directory_size: usize = sheets.iter().map(|(name, _)| bound_sheet(name, 0).len()).sum();
    let mut pointer = stream.len() + directory_size + table.len() + record(EOF, &[]).len();
    for ((name, _), body) in sheets.iter().zip(&bodies) {
        stream.extend(bound_sheet(name, pointer));
        pointer += body.len();
    }
    stream.extend(table);
    stream.extend(record(EOF, &[]));
    for body in bodies {
        stream.extend(body);
    }
    stream
}

/// Sector 0 holds the allocation table, sector 1 the directory and the
/// `Workbook` stream follows from sector 2.
fn compound_file(stream: &[u8]) -> Vec<u8> {
    // Streams under 4096 bytes would go to the mini stream
    let size = stream.len().max(4096);
    let stream_sectors = size.div_ceil(SECTOR);
    let mut stream = stream.to_vec();
    stream.resize(stream_sectors * SECTOR, 0);
    assert!(stream_sectors + 2 <= SECTOR / 4, "stream needs a second allocation sector");

    let mut header = vec![0u8; SECTOR];
    header[0..8].copy_from_slice(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]);
    put(&mut header, 24, &0x003Eu16.to_le_bytes());
    put(&mut header, 26, &3u16.to_le_bytes());
    put(&mut header, 28, &0xFFFEu16.to_le_bytes());
    put(&mut header, 30, &9u16.to_le_bytes());
    put(&mut header, 32, &6u16.to_le_bytes());
    put(&mut header, 44, &1u32.to_le_bytes());
    put(&mut header, 48, &1u32.to_le_bytes());
    put(&mut header, 56, &4096u32.to_le_bytes());
    put(&mut header, 60, &END_OF_CHAIN.to_le_bytes());
    put(&mut header, 68, &END_OF_CHAIN.to_le_bytes());
    for slot in 0..109 {
        let sector = if slot == 0 { 0 } else { FREE_SECTOR };
        put(&mut header, 76 + slot * 4, &sector.to_le_bytes());
    }

    let mut table = vec![FREE_SECTOR; SECTOR / 4];
    table[0] = FAT_SECTOR;
    table[1] = END_OF_CHAIN;
    for sector in 2..2 + stream_sectors {
        table[sector] = if sector + 1 < 2 + stream_sectors { sector as u32 + 1 } else { END_OF_CHAIN };
    }

    let mut directory = vec![0u8; SECTOR];
    for (index, entry) in directory.chunks_exact_mut(128).enumerate() {
        match index {
            0 => directory_entry(entry, "Root Entry", 5, 1, END_OF_CHAIN, 0),
            1 => directory_entry(entry, "Workbook", 2, FREE_SECTOR, 2, size),
            _ => directory_entry(entry, "", 0, FREE_SECTOR, 0, 0),
        }
    }

    let mut file = header;
    file.extend(table.iter().flat_map(|sector| sector.to_le_bytes()));
    file.extend(directory);
    file.extend(stream);
    file
}

fn directory_entry(entry: &mut [u8], name: &str, kind: u8, child: u32, start: u32, size: usize) {
    let mut encoded = utf16(name);
    if !encoded.is_empty() {
        encoded.extend_from_slice(&[0, 0]);
    }
    put(entry, 0, &encoded);
    put(entry, 64, &(encoded.len() as u16).to_le_bytes());
    entry[66] = kind;
    entry[67] = 1;
    put(entry, 68, &FREE_SECTOR.to_le_bytes());
    put(entry, 72, &FREE_SECTOR.to_le_bytes());
    put(entry, 76, &child.to_le_bytes());
    put(entry, 116, &start.to_le_bytes());
    put(entry, 120, &(size as u64).to_le_bytes());
}

fn put(buffer: &mut [u8], offset: usize, bytes: &[u8]) {
    buffer[offset..offset + bytes.len()].copy_from_slice(bytes);
}

/// `ОСФР` sheet: a title row, the header text row, one complete entry and
/// one entry without a location.
pub const STAFF_ROWS: &[&[&str]] = &[
    &["", "", "", "", "", "", "", "", "", "Телефонный справочник"],
    &["Городской номер", "Кор. тел.", "№ комн.", "Фамилия", "Имя", "Отчество", "Должность", "Отдел", "Место расположения"],
    &["123456", "2101", "101", "Иванов", "Иван", "Иванович", "Начальник", "Отдел кадров", "здание 1"],
    &["23-45-67", "2102", "102", "Петров", "Пётр", "Петрович", "Специалист", "Отдел кадров", ""],
];

/// `Клиентские службы` sheet: a title row, the header text row, a section
/// label and two entries.
pub const CLIENT_SERVICE_ROWS: &[&[&str]] = &[
    &["", "", "", "", "", "", "", "Клиентские службы"],
    &["кспд", "город", "Фамилия", "Имя", "Отчество", "Должность", "Место расположения"],
    &["Клиентская служба в г. Пенза", "", "", "", "", "", ""],
    &["3101", "54321", "Петрова", "Анна", "Ивановна", "Руководитель", "г. Пенза"],
    &["3102", "5-43-22", "Сидорова", "Мария", "Петровна", "Специалист", "г. Пенза"],
];
