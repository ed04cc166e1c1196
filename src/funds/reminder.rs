use super::model::{EmailDateEntry, Fund, FundIssue};
use chrono::NaiveDate;

/// 行的显示强调；两个标志互不排斥，停用且当天的行既置灰又加粗
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowEmphasis {
    /// 未设置、未启用或已过期
    pub dimmed: bool,
    /// 当天发送
    pub today: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReminderRow {
    pub issue_date: Option<String>,
    pub deadline_date: Option<String>,
    pub email_date: Option<String>,
    /// 距今天数；没有对应邮件日期或日期无法解析时为 None
    pub day_offset: Option<i64>,
    pub sent: Option<bool>,
    pub enabled: bool,
    pub emphasis: RowEmphasis,
}

/// 统一分隔符为 `/`；空值返回 None
pub fn normalize_date(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.replace('-', "/"))
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim().replace('/', "-").as_str(), "%Y-%m-%d").ok()
}

/// 两个日期都按本地零点处理，差值即整天数
pub fn day_offset(email_date: &str, today: NaiveDate) -> Option<i64> {
    parse_date(email_date).map(|d| (d - today).num_days())
}

pub fn reminder_row(
    issue: &FundIssue,
    entry: Option<&EmailDateEntry>,
    today: NaiveDate,
) -> ReminderRow {
    let issue_date = normalize_date(issue.issue_date.as_deref());
    let deadline_date = normalize_date(issue.deadline_date.as_deref());

    let Some(entry) = entry else {
        return ReminderRow {
            issue_date,
            deadline_date,
            email_date: None,
            day_offset: None,
            sent: None,
            enabled: false,
            emphasis: RowEmphasis {
                dimmed: true,
                today: false,
            },
        };
    };

    let offset = day_offset(&entry.date, today);
    let emphasis = RowEmphasis {
        dimmed: !entry.is_enabled || offset.is_some_and(|d| d < 0),
        today: offset == Some(0),
    };

    ReminderRow {
        issue_date,
        deadline_date,
        email_date: normalize_date(Some(&entry.date)),
        day_offset: offset,
        sent: Some(entry.is_sent),
        enabled: entry.is_enabled,
        emphasis,
    }
}

/// 按下标把邮件日期对齐到 issues；列表较短时多出的行视为无邮件日期
pub fn reminder_rows(
    fund: &Fund,
    email_dates: Option<&[EmailDateEntry]>,
    today: NaiveDate,
) -> Vec<ReminderRow> {
    fund.issues
        .iter()
        .enumerate()
        .map(|(i, issue)| reminder_row(issue, email_dates.and_then(|d| d.get(i)), today))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 13).unwrap()
    }

    fn entry(date: &str, enabled: bool, sent: bool) -> EmailDateEntry {
        EmailDateEntry {
            date: date.to_string(),
            is_enabled: enabled,
            is_sent: sent,
        }
    }

    fn issue(issue: &str, deadline: &str) -> FundIssue {
        FundIssue {
            issue_date: Some(issue.to_string()),
            deadline_date: Some(deadline.to_string()),
        }
    }

    #[test]
    fn offset_is_zero_today_and_minus_one_yesterday() {
        assert_eq!(day_offset("2024/05/13", today()), Some(0));
        assert_eq!(day_offset("2024-05-12", today()), Some(-1));
        assert_eq!(day_offset("2024/06/13", today()), Some(31));
    }

    #[test]
    fn offset_is_none_for_garbage() {
        assert_eq!(day_offset("soon", today()), None);
    }

    #[test]
    fn dates_are_normalized_to_slashes() {
        let row = reminder_row(&issue("2024-05-01", "2024-05-08"), None, today());
        assert_eq!(row.issue_date.as_deref(), Some("2024/05/01"));
        assert_eq!(row.deadline_date.as_deref(), Some("2024/05/08"));
        assert_eq!(normalize_date(Some("  ")), None);
    }

    #[test]
    fn rows_beyond_email_dates_are_not_applicable() {
        let fund = Fund {
            name: "F".to_string(),
            issues: vec![
                issue("2024-05-01", "2024-05-08"),
                issue("2024-06-01", "2024-06-08"),
                issue("2024-07-01", "2024-07-08"),
            ],
        };
        let dates = vec![entry("2024/05/13", true, true)];
        let rows = reminder_rows(&fund, Some(&dates), today());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].day_offset, Some(0));
        assert_eq!(rows[0].sent, Some(true));
        assert!(rows[0].emphasis.today);
        assert!(!rows[0].emphasis.dimmed);
        for row in &rows[1..] {
            assert_eq!(row.email_date, None);
            assert_eq!(row.day_offset, None);
            assert_eq!(row.sent, None);
            assert!(row.emphasis.dimmed);
            assert!(!row.emphasis.today);
        }
    }

    #[test]
    fn no_email_dates_at_all() {
        let fund = Fund {
            name: "F".to_string(),
            issues: vec![issue("2024-05-01", "2024-05-08")],
        };
        let rows = reminder_rows(&fund, None, today());
        assert_eq!(rows[0].day_offset, None);
    }

    #[test]
    fn emphasis_follows_enabled_and_offset() {
        let i = issue("2024-05-01", "2024-05-08");
        let past = reminder_row(&i, Some(&entry("2024/05/10", true, true)), today());
        let future = reminder_row(&i, Some(&entry("2024/05/20", true, false)), today());
        let disabled = reminder_row(&i, Some(&entry("2024/05/13", false, false)), today());
        assert_eq!(past.emphasis, RowEmphasis { dimmed: true, today: false });
        assert_eq!(future.emphasis, RowEmphasis::default());
        assert_eq!(future.sent, Some(false));
        assert_eq!(disabled.day_offset, Some(0));
    }

    #[test]
    fn disabled_row_due_today_is_both_dimmed_and_today() {
        let i = issue("2024-05-01", "2024-05-08");
        let row = reminder_row(&i, Some(&entry("2024/05/13", false, false)), today());
        assert_eq!(row.emphasis, RowEmphasis { dimmed: true, today: true });

        let disabled_future = reminder_row(&i, Some(&entry("2024/05/20", false, false)), today());
        assert_eq!(disabled_future.emphasis, RowEmphasis { dimmed: true, today: false });
    }
}
