use super::*;

impl DateRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

impl CheckFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_id(mut self, val: impl Into<String>) -> Self {
        self.user_id = Some(val.into());
        self
    }

    pub fn resource(mut self, val: impl Into<String>) -> Self {
        self.resource = Some(val.into());
        self
    }

    pub fn action(mut self, val: impl Into<String>) -> Self {
        self.action = Some(val.into());
        self
    }

    pub fn result(mut self, val: bool) -> Self {
        self.result = Some(val);
        self
    }

    pub fn date_range(mut self, start: i64, end: i64) -> Self {
        self.date_range = Some(DateRange::new(start, end));
        self
    }

    pub fn matches(&self, check: &PermissionCheck) -> bool {
        self.user_id.as_ref().map_or(true, |v| *v == check.user_id) &&
        self.resource.as_ref().map_or(true, |v| *v == check.resource) &&
        self.action.as_ref().map_or(true, |v| *v == check.action) &&
        self.result.map_or(true, |v| v == check.result) &&
        self.date_range.map_or(true, |v| v.contains(check.timestamp))
    }
}

impl PermissionCheck {
    pub fn new(
        user_id: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
        context: Context,
        timestamp: i64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            resource: resource.into(),
            action: action.into(),
            context,
            result: false,
            reason: None,
            timestamp,
        }
    }

    pub fn granted(mut self, reason: impl Into<String>) -> Self {
        self.result = true;
        self.reason = Some(reason.into());
        self
    }

    pub fn denied(mut self, reason: impl Into<String>) -> Self {
        self.result = false;
        self.reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn check(user_id: &str, result: bool, timestamp: i64) -> PermissionCheck {
        let check = PermissionCheck::new(
            user_id, "budgets", "view", Context::new(), timestamp,
        );
        if result {
            check.granted("Direct permission")
        } else {
            check.denied("Permission not found")
        }
    }

    #[test]
    fn date_range_inclusive() {
        let range = DateRange::new(10, 20);
        assert!(!range.contains(9));
        assert!(range.contains(10));
        assert!(range.contains(20));
        assert!(!range.contains(21));
    }

    #[test]
    fn filter() {
        let filter = CheckFilter::new();
        assert!(filter.matches(&check("alice", true, 1)));

        let filter = CheckFilter::new()
            .user_id("alice")
            .result(false)
            .date_range(5, 15);
        assert!(filter.matches(&check("alice", false, 5)));
        assert!(!filter.matches(&check("alice", true, 5)));
        assert!(!filter.matches(&check("bob", false, 5)));
        assert!(!filter.matches(&check("alice", false, 16)));

        let filter = CheckFilter::new()
            .resource("budgets")
            .action("edit");
        assert!(!filter.matches(&check("alice", true, 1)));
    }
}
