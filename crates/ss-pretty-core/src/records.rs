/// One connection's report: the address line followed by the kernel detail line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord<'a> {
    pub header: &'a str,
    pub detail: &'a str,
}

/// Splits one cycle of command output into records. The first line is the
/// command's own column header; a trailing line without its detail line is dropped.
pub fn split_records(output: &str) -> Vec<RawRecord<'_>> {
    let lines: Vec<&str> = output.lines().skip(1).collect();
    lines
        .chunks_exact(2)
        .map(|pair| RawRecord {
            header: pair[0],
            detail: pair[1],
        })
        .collect()
}
