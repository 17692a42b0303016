// ==========================================
// 电商报表摄取引擎 - 自动文件修复服务
// ==========================================
// 职责: 从损坏的 OLE 二进制文件中重建可解析的 ZIP 容器
// 策略: 缓存命中 → OLE Package 流提取 → 裁剪嵌入的 PK 签名
// 约束: 只产出能通过 ZIP 校验的完整容器，绝不产出半修复文件；
//       不改动原始文件，修复件写入缓存目录
// ==========================================

use crate::format::{OLE_MAGIC, ZIP_MAGIC};
use crate::mapper::translit::fnv1a32;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 自动修复服务。best-effort，不可修复时返回 None
pub struct AutoRepairService {
    cache_dir: PathBuf,
}

impl AutoRepairService {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// 修复后文件的缓存路径: <cache>/<stem>_<路径哈希8位>.xlsx
    pub fn repaired_path(&self, original: &Path) -> PathBuf {
        let stem = original
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "repaired".to_string());
        let hash = fnv1a32(&original.to_string_lossy());
        self.cache_dir.join(format!("{}_{:08x}.xlsx", stem, hash))
    }

    /// 尝试修复损坏的二进制文件
    ///
    /// # 返回
    /// - Some(path): 修复件路径，保证是合法 ZIP 容器
    /// - None: 无法修复（RepairUnavailable，仅从回退链中移除一个分支）
    pub fn repair(&self, path: &Path) -> Option<PathBuf> {
        // Step 1: 检查缓存
        let repaired = self.repaired_path(path);
        if repaired.exists() {
            info!(cache = %repaired.display(), "使用修复缓存");
            return Some(repaired);
        }

        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "修复前读取文件失败");
                return None;
            }
        };

        // Step 2: OLE 容器内提取 OOXML Package 流
        // （含图片/加壳导出件常把整个 ZIP 包塞进一个流）
        let candidate = self
            .extract_package_stream(&bytes)
            .or_else(|| Self::carve_embedded_zip(&bytes));

        let zip_bytes = candidate?;

        // Step 3: 写入缓存（目录缺失时创建）
        if let Err(e) = std::fs::create_dir_all(&self.cache_dir) {
            warn!(error = %e, "创建修复缓存目录失败");
            return None;
        }
        if let Err(e) = std::fs::write(&repaired, &zip_bytes) {
            warn!(error = %e, "写入修复文件失败");
            // 清理可能的半成品
            let _ = std::fs::remove_file(&repaired);
            return None;
        }

        info!(
            source = %path.display(),
            repaired = %repaired.display(),
            size_kb = zip_bytes.len() / 1024,
            "自动修复成功"
        );
        Some(repaired)
    }

    /// 从 OLE 容器中提取名为 Package 的 OOXML 流
    fn extract_package_stream(&self, bytes: &[u8]) -> Option<Vec<u8>> {
        if !bytes.starts_with(&OLE_MAGIC) {
            return None;
        }
        let cursor = Cursor::new(bytes);
        let mut ole = match cfb::CompoundFile::open(cursor) {
            Ok(ole) => ole,
            Err(e) => {
                debug!(error = %e, "OLE 容器打开失败");
                return None;
            }
        };

        let mut package = Vec::new();
        match ole.open_stream("Package") {
            Ok(mut stream) => {
                if let Err(e) = stream.read_to_end(&mut package) {
                    debug!(error = %e, "Package 流读取失败");
                    return None;
                }
            }
            Err(e) => {
                debug!(error = %e, "OLE 容器中无 Package 流");
                return None;
            }
        }

        if Self::validate_zip(&package) {
            debug!(size = package.len(), "从 Package 流提取到合法 ZIP");
            Some(package)
        } else {
            None
        }
    }

    /// 在原始字节中扫描嵌入的 PK 签名并裁剪尾部
    fn carve_embedded_zip(bytes: &[u8]) -> Option<Vec<u8>> {
        let pos = bytes
            .windows(ZIP_MAGIC.len())
            .position(|w| w == ZIP_MAGIC)?;
        let carved = bytes[pos..].to_vec();
        if Self::validate_zip(&carved) {
            debug!(offset = pos, "从嵌入偏移裁剪到合法 ZIP");
            Some(carved)
        } else {
            None
        }
    }

    /// 校验候选字节是合法的 XLSX ZIP 容器
    fn validate_zip(bytes: &[u8]) -> bool {
        let Ok(mut archive) = zip::ZipArchive::new(Cursor::new(bytes)) else {
            return false;
        };
        let has_content_types = archive.by_name("[Content_Types].xml").is_ok();
        has_content_types
    }
}
