//! `tablero classify`: append Grupo / Categoria_Principal / Subcategoria
//! columns to a long-format CSV.

use anyhow::{Context, Result, bail};
use std::io::{Read, Write};
use tablero_core::{CategoryClassifier, parse_locale_amount};

pub const OUTPUT_COLUMNS: [&str; 3] = ["Grupo", "Categoria_Principal", "Subcategoria"];

/// Returns the number of data rows written.
pub fn classify_csv<R: Read, W: Write>(
    classifier: &CategoryClassifier,
    input: R,
    output: W,
    label_column: &str,
    amount_column: &str,
) -> Result<usize> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(input);
    let headers = rdr.headers().context("reading header row")?.clone();

    let find = |name: &str| headers.iter().position(|h| h.trim() == name);
    let Some(label_idx) = find(label_column) else {
        bail!("label column '{label_column}' not found in header");
    };
    let Some(amount_idx) = find(amount_column) else {
        bail!("amount column '{amount_column}' not found in header");
    };

    let rows = rdr.records().collect::<Result<Vec<_>, _>>().context("reading rows")?;
    let classified = classifier.classify_table(
        rows,
        |r| r.get(label_idx).unwrap_or("").trim(),
        |r| parse_locale_amount(r.get(amount_idx).unwrap_or("")),
    );

    let mut wtr = csv::Writer::from_writer(output);
    let mut out_headers = headers.clone();
    for col in OUTPUT_COLUMNS {
        out_headers.push_field(col);
    }
    wtr.write_record(&out_headers)?;

    let count = classified.len();
    for (mut row, c) in classified {
        // Appended columns must line up with the header.
        row.truncate(headers.len());
        while row.len() < headers.len() {
            row.push_field("");
        }
        row.push_field(&c.group);
        row.push_field(&c.principal);
        row.push_field(c.subcategory.as_deref().unwrap_or(""));
        wtr.write_record(&row)?;
    }
    wtr.flush()?;

    tracing::info!(rows = count, "classified table written");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablero_core::CategoryConfig;

    const CONFIG: &str = r##"
grupos:
  necesario: { nombre: Necesario, tipo: gasto }
  ingreso_ocasional: { nombre: Ingreso Ocasional, tipo: ingreso }
  discrecional: { nombre: Discrecional, tipo: gasto }
jerarquia_categorias:
  Necesario:
    Transporte: { grupo: necesario, subcategorias: [Combustible] }
categorias_contextuales:
  Otros:
    clasificar_por: signo_monto
    si_positivo: { grupo: ingreso_ocasional, categoria_principal: Otros Ingresos }
    si_negativo: { grupo: discrecional, categoria_principal: Otros Gastos }
filas_resumen: [Gastos]
"##;

    fn classifier() -> CategoryClassifier {
        CategoryClassifier::new(CategoryConfig::from_yaml_str(CONFIG).unwrap())
    }

    #[test]
    fn test_appends_classification_columns() {
        let input = "Fecha,Categoria,Monto\n2024-01-01,Combustible,\"-1.500,00\"\n2024-01-02,Otros,200\n2024-01-03,Gastos,-9\n";
        let mut out = Vec::new();
        let n = classify_csv(&classifier(), input.as_bytes(), &mut out, "Categoria", "Monto").unwrap();
        assert_eq!(n, 3);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Fecha,Categoria,Monto,Grupo,Categoria_Principal,Subcategoria");
        assert_eq!(lines[1], "2024-01-01,Combustible,\"-1.500,00\",Necesario,Transporte,Combustible");
        assert_eq!(lines[2], "2024-01-02,Otros,200,Ingreso Ocasional,Otros Ingresos,");
        assert_eq!(lines[3], "2024-01-03,Gastos,-9,Resumen,Gastos,");
    }

    #[test]
    fn test_custom_column_names() {
        let input = "label;amount\n";
        let err = classify_csv(&classifier(), input.as_bytes(), Vec::new(), "Categoria", "Monto").unwrap_err();
        assert!(err.to_string().contains("label column 'Categoria'"));

        let input = "label,amount\nOtros,-3\n";
        let mut out = Vec::new();
        classify_csv(&classifier(), input.as_bytes(), &mut out, "label", "amount").unwrap();
        assert!(String::from_utf8(out).unwrap().contains("Otros,-3,Discrecional,Otros Gastos,"));
    }

    #[test]
    fn test_short_rows_are_padded() {
        let input = "Categoria,Monto,Nota\nCombustible,-5\n";
        let mut out = Vec::new();
        classify_csv(&classifier(), input.as_bytes(), &mut out, "Categoria", "Monto").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().nth(1).unwrap(), "Combustible,-5,,Necesario,Transporte,Combustible");
    }
}
