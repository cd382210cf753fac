//! Function and parameter catalogs.
//!
//! Two CSV tables drive every run:
//!
//! | Table | Columns |
//! |-------|---------|
//! | functions  | `Function_Name, API_Key, Endpoint, Model, Description` |
//! | parameters | `GPT_Function_Parent, GPT_Function_Parameter_Name, Paremeter_Type, Parameter_Description, Parameter_Enums, Required` |
//!
//! The operator picks one function by its 1-based position; the matching
//! parameter rows (by `GPT_Function_Parent`) become the tool schema.

use crate::config::normalize_function_name;
use crate::error::Pdf2CsvError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{BufRead, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One selectable extraction job.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    #[serde(rename = "Function_Name")]
    pub name: String,
    #[serde(rename = "API_Key")]
    pub api_key: String,
    #[serde(rename = "Endpoint")]
    pub endpoint: String,
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "Description", default)]
    pub description: String,
}

impl FunctionRecord {
    /// The API key with everything but a short prefix and suffix hidden.
    pub fn masked_api_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.len() <= 10 {
            return "*".repeat(chars.len().max(4));
        }
        let head: String = chars[..3].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}…{tail}")
    }
}

impl fmt::Debug for FunctionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRecord")
            .field("name", &self.name)
            .field("api_key", &self.masked_api_key())
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("description", &self.description)
            .finish()
    }
}

/// One expected output field of a function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterRecord {
    #[serde(rename = "GPT_Function_Parent")]
    pub parent_function_name: String,
    #[serde(rename = "GPT_Function_Parameter_Name")]
    pub parameter_name: String,
    /// The historical header is misspelled; both spellings are accepted.
    #[serde(rename = "Paremeter_Type", alias = "Parameter_Type")]
    pub parameter_type: String,
    #[serde(rename = "Parameter_Description", default)]
    pub description: String,
    /// Literal list text such as `['A', 'B']`. Empty cells read as `None`.
    #[serde(rename = "Parameter_Enums", default)]
    pub enum_literal: Option<String>,
    #[serde(rename = "Required", default)]
    pub required: Option<String>,
}

impl ParameterRecord {
    /// Only the exact flag `"Yes"` marks a parameter as required.
    pub fn is_required(&self) -> bool {
        self.required.as_deref() == Some("Yes")
    }
}

/// The function chosen by the operator and the parameter rows that belong to it.
///
/// Every record in `parameters` has `parent_function_name == function.name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSelection {
    pub function: FunctionRecord,
    pub parameters: Vec<ParameterRecord>,
}

impl FunctionSelection {
    /// Tool name sent to the service: the function name with spaces replaced.
    pub fn tool_name(&self) -> String {
        normalize_function_name(&self.function.name)
    }
}

/// Both catalogs, loaded in file order.
#[derive(Debug, Clone)]
pub struct Catalog {
    functions: Vec<FunctionRecord>,
    parameters: Vec<ParameterRecord>,
    functions_source: PathBuf,
}

impl Catalog {
    /// Load both catalogs from CSV files.
    pub fn load(
        functions_csv: impl AsRef<Path>,
        parameters_csv: impl AsRef<Path>,
    ) -> Result<Self, Pdf2CsvError> {
        let functions_csv = functions_csv.as_ref();
        let parameters_csv = parameters_csv.as_ref();

        let functions = read_records(open_catalog(functions_csv)?, functions_csv)?;
        let parameters = read_records(open_catalog(parameters_csv)?, parameters_csv)?;
        debug!(
            "Loaded {} functions from {} and {} parameters from {}",
            functions.len(),
            functions_csv.display(),
            parameters.len(),
            parameters_csv.display()
        );

        Ok(Self {
            functions,
            parameters,
            functions_source: functions_csv.to_path_buf(),
        })
    }

    /// Load both catalogs from in-memory CSV sources.
    pub fn from_readers(functions: impl Read, parameters: impl Read) -> Result<Self, Pdf2CsvError> {
        let functions_source = PathBuf::from("<functions>");
        Ok(Self {
            functions: read_records(functions, &functions_source)?,
            parameters: read_records(parameters, Path::new("<parameters>"))?,
            functions_source,
        })
    }

    pub fn functions(&self) -> &[FunctionRecord] {
        &self.functions
    }

    pub fn parameters(&self) -> &[ParameterRecord] {
        &self.parameters
    }

    /// Function names in catalog order.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().map(|f| f.name.as_str())
    }

    /// Parameter rows whose parent is `function_name`, in catalog order.
    pub fn parameters_for(&self, function_name: &str) -> Vec<ParameterRecord> {
        self.parameters
            .iter()
            .filter(|p| p.parent_function_name == function_name)
            .cloned()
            .collect()
    }

    /// Resolve an operator answer (a 1-based index) to a function and its parameters.
    ///
    /// # Errors
    /// * [`Pdf2CsvError::EmptyCatalog`] — nothing to select
    /// * [`Pdf2CsvError::InvalidSelection`] — not a number, `0`, or past the end
    /// * [`Pdf2CsvError::NoParameters`] — the function has no parameter rows
    pub fn select(&self, input: &str) -> Result<FunctionSelection, Pdf2CsvError> {
        if self.functions.is_empty() {
            return Err(Pdf2CsvError::EmptyCatalog {
                path: self.functions_source.clone(),
            });
        }

        let invalid = || Pdf2CsvError::InvalidSelection {
            input: input.trim().to_string(),
            max: self.functions.len(),
        };
        let choice: usize = input.trim().parse().map_err(|_| invalid())?;
        let function = choice
            .checked_sub(1)
            .and_then(|idx| self.functions.get(idx))
            .ok_or_else(invalid)?
            .clone();

        let parameters = self.parameters_for(&function.name);
        if parameters.is_empty() {
            return Err(Pdf2CsvError::NoParameters {
                function: function.name,
            });
        }

        Ok(FunctionSelection {
            function,
            parameters,
        })
    }

    /// The numbered menu shown to the operator.
    pub fn format_menu(&self) -> String {
        let mut menu = String::from("Available Functions:\n");
        for (idx, name) in self.function_names().enumerate() {
            menu.push_str(&format!("{}. {}\n", idx + 1, name));
        }
        menu
    }
}

/// Show the menu on `output`, read one line from `input`, and resolve it.
pub fn prompt_for_selection<R: BufRead, W: Write>(
    catalog: &Catalog,
    input: &mut R,
    output: &mut W,
) -> Result<FunctionSelection, Pdf2CsvError> {
    write!(
        output,
        "{}Select the function by entering the corresponding number: ",
        catalog.format_menu()
    )
    .and_then(|_| output.flush())
    .map_err(Pdf2CsvError::Prompt)?;

    let mut answer = String::new();
    input.read_line(&mut answer).map_err(Pdf2CsvError::Prompt)?;
    catalog.select(&answer)
}

fn open_catalog(path: &Path) -> Result<std::fs::File, Pdf2CsvError> {
    std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Pdf2CsvError::CatalogNotFound {
            path: path.to_path_buf(),
        },
        _ => Pdf2CsvError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })
}

fn read_records<T, R>(reader: R, path: &Path) -> Result<Vec<T>, Pdf2CsvError>
where
    T: serde::de::DeserializeOwned,
    R: Read,
{
    csv::ReaderBuilder::new()
        .from_reader(reader)
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()
        .map_err(|source| Pdf2CsvError::CatalogParse {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FUNCTIONS: &str = "\
Function_Name,API_Key,Endpoint,Model,Description
Invoice Reader,sk-test-0123456789abcd,https://api.example.com/v1/chat/completions,gpt-4o,Reads invoices
Receipt Reader,sk-test-abcdefghijklmn,https://api.example.com/v1/chat/completions,gpt-4o-mini,Reads receipts
Contract Reader,sk-test-zzzzzzzzzzzzzz,https://api.example.com/v1/chat/completions,gpt-4o,Reads contracts
";

    const PARAMETERS: &str = "\
GPT_Function_Parent,GPT_Function_Parameter_Name,Paremeter_Type,Parameter_Description,Parameter_Enums,Required
Invoice Reader,invoice_number,string,The invoice number,,Yes
Receipt Reader,store,string,Store name,,Yes
Invoice Reader,currency,string,Currency code,\"['EUR', 'USD']\",No
Invoice Reader,total,number,Grand total,,Yes
";

    fn catalog() -> Catalog {
        Catalog::from_readers(FUNCTIONS.as_bytes(), PARAMETERS.as_bytes()).unwrap()
    }

    #[test]
    fn loads_rows_in_file_order() {
        let c = catalog();
        let names: Vec<&str> = c.function_names().collect();
        assert_eq!(names, ["Invoice Reader", "Receipt Reader", "Contract Reader"]);
        assert_eq!(c.parameters().len(), 4);
    }

    #[test]
    fn empty_cells_read_as_none() {
        let c = catalog();
        let p = &c.parameters()[0];
        assert_eq!(p.enum_literal, None);
        assert_eq!(p.required.as_deref(), Some("Yes"));
        assert_eq!(c.parameters()[2].enum_literal.as_deref(), Some("['EUR', 'USD']"));
    }

    #[test]
    fn select_picks_row_k_minus_one() {
        let c = catalog();
        let sel = c.select("2").unwrap();
        assert_eq!(sel.function.name, "Receipt Reader");
        assert_eq!(sel.function.model, "gpt-4o-mini");

        let sel = c.select(" 1\n").unwrap();
        assert_eq!(sel.function.name, "Invoice Reader");
    }

    #[test]
    fn select_collects_matching_parameters_in_order() {
        let sel = catalog().select("1").unwrap();
        let names: Vec<&str> = sel
            .parameters
            .iter()
            .map(|p| p.parameter_name.as_str())
            .collect();
        assert_eq!(names, ["invoice_number", "currency", "total"]);
        assert!(sel
            .parameters
            .iter()
            .all(|p| p.parent_function_name == sel.function.name));
    }

    #[test]
    fn select_rejects_out_of_range_and_garbage() {
        let c = catalog();
        for input in ["0", "4", "abc", "", "-1", "1.5"] {
            let err = c.select(input).unwrap_err();
            assert!(
                matches!(err, Pdf2CsvError::InvalidSelection { max: 3, .. }),
                "input {input:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn select_fails_without_parameters() {
        let err = catalog().select("3").unwrap_err();
        assert!(
            matches!(err, Pdf2CsvError::NoParameters { ref function } if function == "Contract Reader")
        );
    }

    #[test]
    fn select_on_empty_catalog() {
        let c = Catalog::from_readers(
            "Function_Name,API_Key,Endpoint,Model,Description\n".as_bytes(),
            PARAMETERS.as_bytes(),
        )
        .unwrap();
        assert!(matches!(c.select("1"), Err(Pdf2CsvError::EmptyCatalog { .. })));
    }

    #[test]
    fn accepts_corrected_type_header() {
        let params = "\
GPT_Function_Parent,GPT_Function_Parameter_Name,Parameter_Type,Parameter_Description,Parameter_Enums,Required
Invoice Reader,total,number,Grand total,,Yes
";
        let c = Catalog::from_readers(FUNCTIONS.as_bytes(), params.as_bytes()).unwrap();
        assert_eq!(c.parameters()[0].parameter_type, "number");
    }

    #[test]
    fn missing_column_is_a_parse_error() {
        let err = Catalog::from_readers("Function_Name\nX\n".as_bytes(), PARAMETERS.as_bytes())
            .unwrap_err();
        assert!(matches!(err, Pdf2CsvError::CatalogParse { .. }));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Catalog::load("/definitely/not/here.csv", "/nor/here.csv").unwrap_err();
        assert!(matches!(err, Pdf2CsvError::CatalogNotFound { .. }));
    }

    #[test]
    fn required_flag_is_exact() {
        let mut p = catalog().parameters()[0].clone();
        assert!(p.is_required());
        p.required = Some("yes".into());
        assert!(!p.is_required());
        p.required = None;
        assert!(!p.is_required());
    }

    #[test]
    fn prompt_lists_functions_and_reads_answer() {
        let c = catalog();
        let mut input = "3\n2\n".as_bytes();
        let mut out = Vec::new();
        let sel = prompt_for_selection(&c, &mut &b"2\n"[..], &mut out).unwrap();
        assert_eq!(sel.function.name, "Receipt Reader");

        let shown = String::from_utf8(out).unwrap();
        assert!(shown.starts_with("Available Functions:\n1. Invoice Reader\n"));
        assert!(shown.ends_with("corresponding number: "));

        // First line wins; the function has no parameters.
        let mut sink = Vec::new();
        assert!(prompt_for_selection(&c, &mut input, &mut sink).is_err());
    }

    #[test]
    fn prompt_on_closed_input_is_invalid_selection() {
        let mut out = Vec::new();
        let err = prompt_for_selection(&catalog(), &mut "".as_bytes(), &mut out).unwrap_err();
        assert!(matches!(err, Pdf2CsvError::InvalidSelection { .. }));
    }

    #[test]
    fn debug_masks_api_key() {
        let c = catalog();
        let f = &c.functions()[0];
        let dbg = format!("{f:?}");
        assert!(!dbg.contains("sk-test-0123456789abcd"));
        assert!(dbg.contains("sk-…abcd"));
    }

    #[test]
    fn tool_name_replaces_spaces() {
        assert_eq!(catalog().select("1").unwrap().tool_name(), "Invoice_Reader");
    }
}
