// ==========================================
// 集成测试夹具: 各容器格式的最小可解析文件
// ==========================================

use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;

/// 夹具单元格
#[derive(Debug, Clone)]
pub enum Cell {
    T(&'static str),
    N(f64),
    B,
}

fn column_letter(idx: usize) -> String {
    let mut idx = idx;
    let mut letters = String::new();
    loop {
        letters.insert(0, (b'A' + (idx % 26) as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    letters
}

fn sheet_xml(rows: &[Vec<Cell>]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (r, row) in rows.iter().enumerate() {
        xml.push_str(&format!(r#"<row r="{}">"#, r + 1));
        for (c, cell) in row.iter().enumerate() {
            let cell_ref = format!("{}{}", column_letter(c), r + 1);
            match cell {
                Cell::T(text) => xml.push_str(&format!(
                    r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    cell_ref, text
                )),
                Cell::N(n) => xml.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, cell_ref, n)),
                Cell::B => {} // 省略单元格即空白
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

/// 构造最小合法 XLSX 的 ZIP 字节（calamine 可读，内联字符串）
pub fn xlsx_bytes(rows: &[Vec<Cell>]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    let parts: &[(&str, String)] = &[
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#
                .to_string(),
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#
                .to_string(),
        ),
        (
            "xl/workbook.xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#
                .to_string(),
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#
                .to_string(),
        ),
        ("xl/worksheets/sheet1.xml", sheet_xml(rows)),
    ];

    for (name, content) in parts {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// 写出标准 XLSX 文件
pub fn write_xlsx(path: &Path, rows: &[Vec<Cell>]) {
    std::fs::write(path, xlsx_bytes(rows)).unwrap();
}

/// 写出 HTML 表格文件（平台常以 .xls 扩展名下发）
pub fn write_html_table(path: &Path, rows: &[Vec<&str>]) {
    let mut html = String::from("<html><body><table>");
    for (i, row) in rows.iter().enumerate() {
        html.push_str("<tr>");
        let tag = if i == 0 { "th" } else { "td" };
        for cell in row {
            html.push_str(&format!("<{}>{}</{}>", tag, cell, tag));
        }
        html.push_str("</tr>");
    }
    html.push_str("</table></body></html>");
    std::fs::write(path, html).unwrap();
}

/// 写出"损坏"的 OLE 容器: 无 Workbook 流，但 Package 流内嵌完整 XLSX。
/// 旧式读取必然失败，自动修复可以从中重建
pub fn write_repairable_ole(path: &Path, rows: &[Vec<Cell>]) {
    let mut ole = cfb::CompoundFile::create(Cursor::new(Vec::new())).unwrap();
    ole.create_stream("Package")
        .unwrap()
        .write_all(&xlsx_bytes(rows))
        .unwrap();
    std::fs::write(path, ole.into_inner().into_inner()).unwrap();
}

/// 写出彻底不可解析的 OLE 容器（无 Package 流，无嵌入 ZIP）
pub fn write_hopeless_ole(path: &Path) {
    let mut ole = cfb::CompoundFile::create(Cursor::new(Vec::new())).unwrap();
    ole.create_stream("Junk")
        .unwrap()
        .write_all(b"not a spreadsheet")
        .unwrap();
    std::fs::write(path, ole.into_inner().into_inner()).unwrap();
}
