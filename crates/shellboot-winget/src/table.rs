use shellboot_backend::InstalledPackage;

const TRUNCATION_MARK: char = '…';

struct Columns {
    id: usize,
    version: usize,
    available: Option<usize>,
    source: Option<usize>,
}

impl Columns {
    fn from_header(header: &[char]) -> Option<Self> {
        Some(Self {
            id: find_word(header, "Id")?,
            version: find_word(header, "Version")?,
            available: find_word(header, "Available"),
            source: find_word(header, "Source"),
        })
    }

    fn version_end(&self) -> Option<usize> {
        self.available.or(self.source)
    }
}

/// Parse the fixed-width table printed by `winget list`.
///
/// Column boundaries come from the header row. Progress spinners printed
/// before the table are dropped, as are rows whose id was truncated.
#[must_use]
pub fn parse_list_output(output: &str) -> Vec<InstalledPackage> {
    let lines: Vec<Vec<char>> = output
        .lines()
        .map(|line| line.rsplit('\r').next().unwrap_or(line).chars().collect())
        .collect();

    let Some(header_index) = lines
        .iter()
        .position(|line| Columns::from_header(line).is_some())
    else {
        return Vec::new();
    };
    let Some(columns) = Columns::from_header(&lines[header_index]) else {
        return Vec::new();
    };

    lines[header_index + 1..]
        .iter()
        .filter(|line| !is_separator(line))
        .filter_map(|line| parse_row(line, &columns))
        .collect()
}

fn parse_row(line: &[char], columns: &Columns) -> Option<InstalledPackage> {
    let id = cell(line, columns.id, Some(columns.version))?;
    if id.ends_with(TRUNCATION_MARK) {
        return None;
    }
    let version = cell(line, columns.version, columns.version_end())?;
    let available = columns
        .available
        .and_then(|start| cell(line, start, columns.source));

    Some(InstalledPackage {
        id,
        version,
        available,
    })
}

fn cell(line: &[char], start: usize, end: Option<usize>) -> Option<String> {
    if start >= line.len() {
        return None;
    }
    let end = end.unwrap_or(line.len()).min(line.len());
    let value: String = line[start..end].iter().collect();
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn find_word(line: &[char], word: &str) -> Option<usize> {
    let word: Vec<char> = word.chars().collect();
    line.windows(word.len()).enumerate().find_map(|(i, window)| {
        let starts_word = i == 0 || line[i - 1].is_whitespace();
        let ends_word = line
            .get(i + word.len())
            .is_none_or(|next| next.is_whitespace());
        (window == word.as_slice() && starts_word && ends_word).then_some(i)
    })
}

fn is_separator(line: &[char]) -> bool {
    !line.is_empty() && line.iter().all(|c| *c == '-' || c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::parse_list_output;

    const SAMPLE: &str = "\
Name                   Id                        Version        Available      Source
-------------------------------------------------------------------------------------
Git                    Git.Git                   2.44.0         2.45.1         winget
PowerShell 7-x64       Microsoft.PowerShell      7.4.2.0                       winget
Oh My Posh             JanDeDobbeleer.OhMyPosh   19.11.4        19.27.0        winget
Local Tool             ARP\\Machine\\X64\\Tool       1.0
";

    #[test]
    fn parses_rows_with_and_without_available_version() {
        let packages = parse_list_output(SAMPLE);

        assert_eq!(packages.len(), 4);
        assert_eq!(packages[0].id, "Git.Git");
        assert_eq!(packages[0].version, "2.44.0");
        assert_eq!(packages[0].available.as_deref(), Some("2.45.1"));
        assert_eq!(packages[1].id, "Microsoft.PowerShell");
        assert_eq!(packages[1].available, None);
        assert_eq!(packages[3].version, "1.0");
        assert_eq!(packages[3].available, None);
    }

    #[test]
    fn ignores_progress_output_before_header() {
        let output = format!("   - \r   \\ \r   | \r{SAMPLE}");

        let packages = parse_list_output(&output);

        assert_eq!(packages.len(), 4);
        assert_eq!(packages[2].id, "JanDeDobbeleer.OhMyPosh");
    }

    #[test]
    fn parses_table_without_available_column() {
        let output = "\
Name   Id        Version  Source
---------------------------------
Git    Git.Git   2.45.1   winget
";

        let packages = parse_list_output(output);

        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].version, "2.45.1");
        assert_eq!(packages[0].available, None);
    }

    #[test]
    fn skips_rows_with_truncated_ids() {
        let output = "\
Name   Id              Version  Available Source
-------------------------------------------------
Foo    Vendor.VeryLon… 1.0      1.1       winget
";

        assert!(parse_list_output(output).is_empty());
    }

    #[test]
    fn output_without_table_yields_nothing() {
        assert!(parse_list_output("No installed package found matching input criteria.").is_empty());
        assert!(parse_list_output("").is_empty());
    }
}
