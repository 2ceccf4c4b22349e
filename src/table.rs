/// Render rows as a left-aligned text table with a leading `(index)` column.
///
/// Every row is expected to have as many cells as there are headers.
pub(crate) fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = std::iter::once("(index)".len())
        .chain(headers.iter().map(|h| h.chars().count()))
        .collect();
    for (index, row) in rows.iter().enumerate() {
        widths[0] = widths[0].max(index.to_string().len());
        for (col, cell) in row.iter().enumerate() {
            widths[col + 1] = widths[col + 1].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header_cells = std::iter::once("(index)").chain(headers.iter().copied());
    push_line(&mut out, header_cells, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, rule.iter().map(String::as_str), &widths);
    for (index, row) in rows.iter().enumerate() {
        let index = index.to_string();
        let cells = std::iter::once(index.as_str()).chain(row.iter().map(String::as_str));
        push_line(&mut out, cells, &widths);
    }
    out
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(line.join(" | ").trim_end());
    out.push('\n');
}
