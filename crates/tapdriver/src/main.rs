fn main() -> anyhow::Result<()> {
    tapdriver::app::run()
}
