/// 识别常见的二进制文件格式
///
/// 导入只接受纯文本 CSV，用户误传表格或文档时给出可读的格式名称。
pub fn detect_binary_format(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
        // ZIP 容器（xlsx/docx 等 OOXML）
        Some("xlsx/zip")
    } else if data.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]) {
        // MS Office 旧格式 (OLE Compound Document)
        Some("xls/doc")
    } else if data.starts_with(b"%PDF") {
        Some("pdf")
    } else if data.starts_with(&[0x1F, 0x8B]) {
        Some("gzip")
    } else if data.iter().take(1024).any(|&b| b == 0) {
        Some("binary")
    } else {
        None
    }
}

/// 将上传内容解码为文本，去掉 Excel 导出时附带的 UTF-8 BOM
pub fn decode_text(data: &[u8]) -> Result<String, String> {
    if let Some(format) = detect_binary_format(data) {
        return Err(format!("不支持的文件格式 ({format})，请另存为 CSV 后重试"));
    }

    let data = data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data);
    String::from_utf8(data.to_vec()).map_err(|e| format!("文件不是有效的 UTF-8 文本: {e}"))
}
