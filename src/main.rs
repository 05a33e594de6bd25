fn main() {
    forensics_tutor_lib::run()
}
