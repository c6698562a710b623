fn main() -> anyhow::Result<()> {
    survey_insight_lib::run()
}
