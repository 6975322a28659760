fn main() -> anyhow::Result<()> {
    xamkit::run()
}
