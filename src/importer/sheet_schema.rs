// ==========================================
// 港口到港舱单系统 - 表格布局配置
// ==========================================
// 职责: 以声明式配置描述每张表（表名 / 表头 / 列选择 / 字段类型 / 必填）
// 列名不再散落在解析代码里；默认值对齐现行模板，可经 config_kv 覆写
// ==========================================

use crate::domain::import::SheetKind;
use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};

/// 显示型日期默认格式（DD/MM/YYYY）
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

// ==========================================
// FieldKind - 字段语义类型
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// 文本（TRIM + 空值标准化）
    Text,
    /// 日期（原生日期 / 序列号 / 固定格式文本）
    Date {
        #[serde(default = "default_date_format")]
        format: String,
    },
    /// 性别（统一为 M/F）
    Sex,
    /// 序号列（用于表尾判定）
    Ordinal,
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

impl FieldKind {
    pub fn date() -> Self {
        FieldKind::Date {
            format: default_date_format(),
        }
    }
}

// ==========================================
// FieldSpec - 字段定义
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// 标准字段名（如 passport_no）
    pub field: String,
    /// 源列名（表头标签或位置列名）
    pub column: String,
    /// 源列别名（不同模板版本的写法）
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub required: bool,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn new(field: &str, column: &str, kind: FieldKind) -> Self {
        Self {
            field: field.to_string(),
            column: column.to_string(),
            aliases: Vec::new(),
            required: false,
            kind,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    /// 所有可匹配的列名（已标准化）
    pub fn candidate_labels(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(&self.column)
            .chain(self.aliases.iter())
            .map(|label| normalize_label(label))
    }
}

// ==========================================
// SheetLayout - 单张表的布局
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetLayout {
    pub kind: SheetKind,
    pub sheet_name: String,
    /// 表头行（跳过 skip_rows 之后的相对行号，0 起）；None 表示无表头
    pub header_row: Option<usize>,
    #[serde(default)]
    pub skip_rows: usize,
    /// 选取的列（绝对列号，A=0）；None 表示全部列
    #[serde(default)]
    pub usecols: Option<Vec<usize>>,
    /// 无表头时按位置赋予的列名
    #[serde(default)]
    pub column_names: Vec<String>,
    pub fields: Vec<FieldSpec>,
    /// 表尾判定字段：该字段为空的第一行即表尾
    #[serde(default)]
    pub terminator: Option<String>,
}

/// 各表必须声明为必填的字段（领域模型的非空字段）
fn mandatory_fields(kind: SheetKind) -> &'static [&'static str] {
    match kind {
        SheetKind::Passenger => &["name", "passport_no"],
        SheetKind::Crew => &["name"],
    }
}

impl SheetLayout {
    /// 旅客表默认布局（有表头）
    pub fn default_passenger() -> Self {
        Self {
            kind: SheetKind::Passenger,
            sheet_name: "FORMAT_ MANIFEST".to_string(),
            header_row: Some(0),
            skip_rows: 0,
            usecols: None,
            column_names: Vec::new(),
            fields: vec![
                FieldSpec::new("name", "HEADER NAME PASSENGER", FieldKind::Text)
                    .aliases(&["NAME", "PASSENGER NAME", "NAMA"])
                    .required(),
                FieldSpec::new("sex", "GENDER", FieldKind::Sex).aliases(&["SEX", "JENIS KELAMIN"]),
                FieldSpec::new("birth_place", "PLACE OF BIRTH", FieldKind::Text)
                    .aliases(&["BIRTH PLACE", "TEMPAT LAHIR"]),
                FieldSpec::new("dob", "DATE OF BIRTH (DD/MM/YYYY)", FieldKind::date())
                    .aliases(&["DATE OF BIRTH", "DOB", "TANGGAL LAHIR"]),
                FieldSpec::new("nationality", "NATIONALITY", FieldKind::Text)
                    .aliases(&["KEWARGANEGARAAN"]),
                FieldSpec::new("passport_no", "PASSPORT NO.", FieldKind::Text)
                    .aliases(&["PASSPORT NO", "PASSPORT NUMBER", "NO. PASPOR"])
                    .required(),
                FieldSpec::new("remarks", "REMARKS", FieldKind::Text).aliases(&["KETERANGAN"]),
            ],
            terminator: None,
        }
    }

    /// 船员表默认布局（Form 22：无表头，跳过 17 行，固定列）
    pub fn default_crew() -> Self {
        let column_names = ["No", "Name", "DOB", "Seaman-book No.", "Seaman-book Expiry", "Rank"];
        Self {
            kind: SheetKind::Crew,
            sheet_name: "Form 22".to_string(),
            header_row: None,
            skip_rows: 17,
            usecols: Some(vec![0, 1, 3, 5, 6, 7]),
            column_names: column_names.iter().map(|c| c.to_string()).collect(),
            fields: vec![
                FieldSpec::new("no", "No", FieldKind::Ordinal),
                FieldSpec::new("name", "Name", FieldKind::Text).required(),
                FieldSpec::new("dob", "DOB", FieldKind::date()),
                FieldSpec::new("seaman_book_no", "Seaman-book No.", FieldKind::Text),
                FieldSpec::new("seaman_book_expiry", "Seaman-book Expiry", FieldKind::date()),
                FieldSpec::new("rank", "Rank", FieldKind::Text),
            ],
            terminator: Some("no".to_string()),
        }
    }

    pub fn default_for(kind: SheetKind) -> Self {
        match kind {
            SheetKind::Passenger => Self::default_passenger(),
            SheetKind::Crew => Self::default_crew(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.field == name)
    }

    /// 校验布局自洽性
    pub fn validate(&self) -> ImportResult<()> {
        if self.sheet_name.trim().is_empty() {
            return Err(ImportError::InvalidLayout("sheet_name 不能为空".to_string()));
        }
        if self.fields.is_empty() {
            return Err(ImportError::InvalidLayout(format!(
                "{} 表未声明任何字段",
                self.kind
            )));
        }

        if self.header_row.is_none() {
            if self.column_names.is_empty() {
                return Err(ImportError::InvalidLayout(format!(
                    "{} 表无表头时必须提供 column_names",
                    self.kind
                )));
            }
            if let Some(cols) = &self.usecols {
                if cols.len() != self.column_names.len() {
                    return Err(ImportError::ColumnMismatch {
                        sheet: self.sheet_name.clone(),
                        expected: cols.len(),
                        actual: self.column_names.len(),
                    });
                }
            }
            let known: Vec<String> = self.column_names.iter().map(|c| normalize_label(c)).collect();
            for spec in &self.fields {
                if !spec.candidate_labels().any(|l| known.contains(&l)) {
                    return Err(ImportError::InvalidLayout(format!(
                        "字段 {} 的列 '{}' 不在 column_names 中",
                        spec.field, spec.column
                    )));
                }
            }
        }

        if let Some(term) = &self.terminator {
            if self.field(term).is_none() {
                return Err(ImportError::InvalidLayout(format!(
                    "表尾判定字段 {} 未声明",
                    term
                )));
            }
        }

        for name in mandatory_fields(self.kind) {
            match self.field(name) {
                Some(spec) if spec.required => {}
                Some(_) => {
                    return Err(ImportError::InvalidLayout(format!(
                        "{} 表字段 {} 必须为必填",
                        self.kind, name
                    )))
                }
                None => {
                    return Err(ImportError::InvalidLayout(format!(
                        "{} 表缺少字段 {}",
                        self.kind, name
                    )))
                }
            }
        }

        Ok(())
    }
}

/// 列名标准化：折叠空白（含换行）+ 大写
///
/// 模板里的表头常带换行，如 "DATE OF BIRTH \n(DD/MM/YYYY)"
pub fn normalize_label(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layouts_are_valid() {
        SheetLayout::default_passenger().validate().unwrap();
        SheetLayout::default_crew().validate().unwrap();
    }

    #[test]
    fn test_normalize_label_collapses_newlines() {
        assert_eq!(
            normalize_label("DATE OF BIRTH \n(DD/MM/YYYY)"),
            "DATE OF BIRTH (DD/MM/YYYY)"
        );
        assert_eq!(normalize_label("  passport   no. "), "PASSPORT NO.");
    }

    #[test]
    fn test_layout_requires_mandatory_fields() {
        let mut layout = SheetLayout::default_passenger();
        layout.fields.retain(|f| f.field != "passport_no");
        assert!(matches!(layout.validate(), Err(ImportError::InvalidLayout(_))));

        let mut layout = SheetLayout::default_passenger();
        for f in layout.fields.iter_mut() {
            if f.field == "name" {
                f.required = false;
            }
        }
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_positional_layout_column_count_mismatch() {
        let mut layout = SheetLayout::default_crew();
        layout.usecols = Some(vec![0, 1, 3]);
        assert!(matches!(
            layout.validate(),
            Err(ImportError::ColumnMismatch { expected: 3, actual: 6, .. })
        ));
    }

    #[test]
    fn test_unknown_terminator_rejected() {
        let mut layout = SheetLayout::default_crew();
        layout.terminator = Some("seq".to_string());
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_layout_json_roundtrip_with_defaults() {
        let json = r#"{
            "kind": "crew",
            "sheet_name": "Crew List",
            "header_row": null,
            "column_names": ["No", "Name"],
            "fields": [
                {"field": "no", "column": "No", "kind": {"type": "ordinal"}},
                {"field": "name", "column": "Name", "required": true, "kind": {"type": "text"}},
                {"field": "dob", "column": "Name", "kind": {"type": "date"}}
            ],
            "terminator": "no"
        }"#;
        let layout: SheetLayout = serde_json::from_str(json).unwrap();
        assert_eq!(layout.skip_rows, 0);
        assert_eq!(layout.field("dob").unwrap().kind, FieldKind::date());
        layout.validate().unwrap();
    }
}
